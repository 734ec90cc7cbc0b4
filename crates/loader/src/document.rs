//! Document structure: the `program` root, `instruction` elements and
//! their `argN` children.

use ippcode_common::{Instruction, LoadError, Opcode, Operand, TypeName};
use roxmltree::{Document, Node, ParsingOptions};

use crate::operand::parse_operand;

const LANGUAGE: &str = "IPPcode23";
const ROOT_ATTRIBUTES: [&str; 3] = ["language", "name", "description"];

/// Parse the document into instructions sorted by declared order.
pub(crate) fn parse_document(source: &str) -> Result<Vec<Instruction>, LoadError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(source, options)
        .map_err(|e| LoadError::MalformedXml(e.to_string()))?;
    let root = doc.root_element();
    check_root(root)?;

    let mut instructions = root
        .children()
        .filter(Node::is_element)
        .map(parse_instruction)
        .collect::<Result<Vec<_>, _>>()?;

    instructions.sort_by_key(|instr| instr.order);
    if let Some(pair) = instructions.windows(2).find(|w| w[0].order == w[1].order) {
        return Err(LoadError::DuplicateOrder {
            order: pair[0].order,
        });
    }

    Ok(instructions)
}

fn check_root(root: Node) -> Result<(), LoadError> {
    if let Some(attr) = root
        .attributes()
        .find(|attr| !ROOT_ATTRIBUTES.contains(&attr.name()))
    {
        return Err(LoadError::UnexpectedRootAttribute {
            name: attr.name().to_string(),
        });
    }

    let tag = root.tag_name().name();
    if tag != "program" {
        return Err(LoadError::UnexpectedRoot {
            tag: tag.to_string(),
        });
    }

    let language = root.attribute("language").unwrap_or_default();
    if !language.eq_ignore_ascii_case(LANGUAGE) {
        return Err(LoadError::WrongLanguage {
            found: language.to_string(),
        });
    }

    Ok(())
}

fn required<'a>(node: Node<'a, '_>, attribute: &'static str) -> Result<&'a str, LoadError> {
    node.attribute(attribute)
        .ok_or_else(|| LoadError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute,
        })
}

fn parse_order(text: &str) -> Result<u32, LoadError> {
    text.trim()
        .parse::<i64>()
        .ok()
        .filter(|&n| n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| LoadError::InvalidOrder {
            text: text.to_string(),
        })
}

fn parse_instruction(node: Node) -> Result<Instruction, LoadError> {
    let tag = node.tag_name().name();
    if tag != "instruction" {
        return Err(LoadError::UnexpectedElement {
            tag: tag.to_string(),
        });
    }

    let order = parse_order(required(node, "order")?)?;
    let mnemonic = required(node, "opcode")?;
    let opcode = Opcode::from_mnemonic(mnemonic.trim()).ok_or_else(|| LoadError::UnknownOpcode {
        order,
        token: mnemonic.to_string(),
    })?;

    let args = parse_args(node, order, opcode)?;
    let signature = opcode.signature();

    for (position, (arg, &kind)) in args.iter().zip(signature).enumerate() {
        if !arg.fits(kind) {
            return Err(LoadError::OperandKindMismatch {
                order,
                opcode: opcode.mnemonic(),
                position: position + 1,
            });
        }
    }

    if let (Opcode::Read, Some(Operand::Type(TypeName::Nil))) = (opcode, args.get(1)) {
        return Err(LoadError::InvalidReadType {
            order,
            ty: TypeName::Nil.name(),
        });
    }

    Ok(Instruction::new(opcode, args).with_order(order))
}

/// Collect `arg1..argN` in positional order regardless of document order.
fn parse_args(node: Node, order: u32, opcode: Opcode) -> Result<Vec<Operand>, LoadError> {
    let arity = opcode.arity();
    let elements: Vec<Node> = node.children().filter(Node::is_element).collect();
    if elements.len() != arity {
        return Err(LoadError::ArgumentCount {
            order,
            opcode: opcode.mnemonic(),
            expected: arity,
            found: elements.len(),
        });
    }

    let mut slots: Vec<Option<Operand>> = vec![None; arity];
    for element in elements {
        let tag = element.tag_name().name();
        let unexpected = || LoadError::UnexpectedArgument {
            order,
            tag: tag.to_string(),
        };

        let position = (1..=arity)
            .find(|n| tag == format!("arg{n}"))
            .ok_or_else(unexpected)?;
        let slot = &mut slots[position - 1];
        if slot.is_some() {
            return Err(unexpected());
        }

        let ty = required(element, "type")?;
        let text = element.text().unwrap_or_default().trim();
        *slot = Some(parse_operand(order, ty, text)?);
    }

    // Every slot is filled: the count matched and no position repeated.
    Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_parsing() {
        assert_eq!(parse_order("1"), Ok(1));
        assert_eq!(parse_order(" 42 "), Ok(42));
        assert_eq!(parse_order("007"), Ok(7));
        assert!(parse_order("0").is_err());
        assert!(parse_order("-3").is_err());
        assert!(parse_order("one").is_err());
        assert!(parse_order("").is_err());
        assert!(parse_order("1.0").is_err());
    }
}
