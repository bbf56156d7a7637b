//! Counts of the Metal-specific vocabulary used in a source file.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::outline::parse_attribute_list;
use crate::tokens::{attribute_specifiers, Token, TokenKind};
use crate::vocab::{is_builtin_type, AddressSpace};

/// How often each Metal extension appears.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    /// Address space qualifiers.
    pub address_spaces: BTreeMap<AddressSpace, usize>,
    /// Metal standard library types, by name.
    pub types: BTreeMap<String, usize>,
    /// Recognised attributes, by name.
    pub attributes: BTreeMap<String, usize>,
}

impl Usage {
    /// Whether no Metal extension was seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.address_spaces.is_empty() && self.types.is_empty() && self.attributes.is_empty()
    }
}

/// Count address spaces, builtin types and recognised attributes.
#[must_use]
pub fn usage(tokens: &[Token]) -> Usage {
    let mut usage = Usage::default();
    let specifiers = attribute_specifiers(tokens);

    for specifier in &specifiers {
        for attribute in parse_attribute_list(&tokens[specifier.inner.clone()]) {
            if attribute.metal.is_some() {
                *usage.attributes.entry(attribute.name).or_default() += 1;
            }
        }
    }

    for (i, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Word || specifiers.iter().any(|s| s.outer.contains(&i)) {
            continue;
        }
        let called = tokens.get(i + 1).is_some_and(|next| next.is_punct("("));
        if let Some(space) = AddressSpace::from_keyword(token.text) {
            if !called {
                *usage.address_spaces.entry(space).or_default() += 1;
            }
        } else if is_builtin_type(token.text) {
            *usage.types.entry(token.text.to_string()).or_default() += 1;
        }
    }
    usage
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::lex;

    #[test]
    fn counts_metal_vocabulary() {
        let source = r"
kernel void blur(texture2d<float, access::read> src [[texture(0)]],
                 texture2d<float, access::write> dst [[texture(1)]],
                 constant float3x3& weights [[buffer(0)]],
                 threadgroup float4* cache [[threadgroup(0)]],
                 uint2 gid [[thread_position_in_grid]])
{
    float4 sum = float4(0.0);
    dst.write(sum, gid);
}
";
        let usage = usage(&lex(source));
        assert_eq!(usage.address_spaces.get(&AddressSpace::Constant), Some(&1));
        assert_eq!(usage.address_spaces.get(&AddressSpace::Threadgroup), Some(&1));
        assert_eq!(usage.address_spaces.get(&AddressSpace::Device), None);
        assert_eq!(usage.types.get("texture2d"), Some(&2));
        assert_eq!(usage.types.get("float4"), Some(&3));
        assert_eq!(usage.types.get("float3x3"), Some(&1));
        assert_eq!(usage.types.get("uint2"), Some(&1));
        assert_eq!(usage.types.get("float"), None);
        assert_eq!(usage.attributes.get("texture"), Some(&2));
        assert_eq!(usage.attributes.get("buffer"), Some(&1));
        assert_eq!(usage.attributes.get("threadgroup"), Some(&1));
        assert_eq!(usage.attributes.get("thread_position_in_grid"), None);
    }

    #[test]
    fn plain_cpp_has_no_metal_usage() {
        let usage = usage(&lex("int main() { float x = 1.0f; return 0; }"));
        assert!(usage.is_empty());
    }

    #[test]
    fn serializes_address_spaces_by_keyword() {
        let usage = usage(&lex("device int* p;"));
        let json = serde_json::to_value(&usage).unwrap();
        assert_eq!(json["address_spaces"]["device"], 1);
    }
}
