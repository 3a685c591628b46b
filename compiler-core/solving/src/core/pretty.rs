//! Human-readable rendering of types and bounds.

use std::fmt::Write;

use points::Points;

use crate::core::{Bound, Constructed, Tag, Type};

pub fn print(points: &Points, t: &Type) -> String {
    let mut output = String::new();
    print_type(points, t, Precedence::Top, &mut output);
    output
}

/// Renders a bound as its trait name applied to its substitutions, in parameter order.
pub fn print_bound(points: &Points, bound: &Bound) -> String {
    let mut output = String::from(points.source(bound.trait_id));
    for t in bound.substitutions.values() {
        output.push(' ');
        print_type(points, t, Precedence::Atom, &mut output);
    }
    output
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Top,
    Atom,
}

fn print_type(points: &Points, t: &Type, precedence: Precedence, output: &mut String) {
    let Type::Constructed(Constructed { tag, children, .. }) = t else {
        output.push('_');
        return;
    };

    match tag {
        Tag::Named(declaration) => {
            let name = points.source(*declaration);
            if children.is_empty() {
                output.push_str(name);
            } else {
                let parenthesise = precedence == Precedence::Atom;
                if parenthesise {
                    output.push('(');
                }
                output.push_str(name);
                for child in children.iter() {
                    output.push(' ');
                    print_type(points, child, Precedence::Atom, output);
                }
                if parenthesise {
                    output.push(')');
                }
            }
        }
        Tag::Parameter(parameter) => output.push_str(&parameter.name),
        Tag::Function => {
            let parenthesise = precedence > Precedence::Top;
            if parenthesise {
                output.push('(');
            }
            // A malformed function without children still prints as a hole.
            let (result, arguments) = match children.split_last() {
                Some((result, arguments)) => (Some(result), arguments),
                None => (None, &children[..]),
            };
            if arguments.is_empty() {
                output.push_str("()");
            }
            for (index, argument) in arguments.iter().enumerate() {
                if index > 0 {
                    output.push(' ');
                }
                print_type(points, argument, Precedence::Atom, output);
            }
            output.push_str(" -> ");
            match result {
                Some(result) => print_type(points, result, Precedence::Top, output),
                None => output.push('_'),
            }
            if parenthesise {
                output.push(')');
            }
        }
        Tag::Tuple => {
            output.push('(');
            for (index, element) in children.iter().enumerate() {
                if index > 0 {
                    output.push_str(" ; ");
                }
                print_type(points, element, Precedence::Top, output);
            }
            output.push(')');
        }
        Tag::Block => {
            output.push('{');
            for child in children.iter() {
                print_type(points, child, Precedence::Top, output);
            }
            output.push('}');
        }
        Tag::Intrinsic => output.push_str("intrinsic"),
        Tag::Message(text) => {
            let _ = write!(output, "{text:?}");
        }
    }
}
