//! Property-based tests over generated identity hierarchies.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p yangplug-tests --test proptest_identities
//! ```

use std::borrow::Cow;
use std::collections::BTreeSet;

use proptest::prelude::*;
use proptest::sample::Index;

use yangplug_plugins::data::{print_lyb_value, print_value, schema_node, type_plugin};
use yangplug_plugins::{free_value, store_lyb_value, store_value, RawValue};
use yangplug_schema::parsed::{ParsedIdentity, ParsedLeaf, ParsedModule};
use yangplug_schema::{IdentityId, ModuleId, NodeId, PrefixData, Unres, ValueFormat, ValueHints};
use yangplug_tests::Harness;

// ============================================================================
// Generated hierarchies
// ============================================================================

/// Base lists of up to 12 identities; identity `i` may only derive from
/// identities before it, so the graph is acyclic.
fn hierarchy() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(any::<Index>(), 0..3), 1..12).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, picks)| {
                let bases: BTreeSet<usize> = if i == 0 {
                    BTreeSet::new()
                } else {
                    picks.iter().map(|pick| pick.index(i)).collect()
                };
                bases.into_iter().collect()
            })
            .collect()
    })
}

/// For every identity, the set of identities it is derived from, itself included.
fn ancestors(bases: &[Vec<usize>]) -> Vec<BTreeSet<usize>> {
    let mut result: Vec<BTreeSet<usize>> = Vec::with_capacity(bases.len());
    for (i, direct) in bases.iter().enumerate() {
        let mut set = BTreeSet::from([i]);
        for &base in direct {
            set.extend(result[base].iter().copied());
        }
        result.push(set);
    }
    result
}

fn module(bases: &[Vec<usize>]) -> ParsedModule {
    let mut builder = ParsedModule::builder("m", "urn:tests:m", "m");
    for (i, direct) in bases.iter().enumerate() {
        let mut identity = ParsedIdentity::new(format!("id{}", i));
        for base in direct {
            identity = identity.base(format!("id{}", base));
        }
        builder = builder.identity(identity);
    }
    builder.leaf(ParsedLeaf::identityref("l", "id0")).build()
}

fn load(bases: &[Vec<usize>]) -> (Harness, ModuleId) {
    let mut h = Harness::new();
    let id = h.add(&module(bases));
    (h, id)
}

fn ident(module: ModuleId, index: usize) -> IdentityId {
    IdentityId {
        module,
        index: index as u32,
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Derivation matches reachability over the declared bases, and every
    /// identity is derived from itself.
    #[test]
    fn derivation_is_reachability(bases in hierarchy()) {
        let (h, id) = load(&bases);
        let expected = ancestors(&bases);

        for (i, above) in expected.iter().enumerate() {
            prop_assert!(h.ctx.is_derived(ident(id, i), ident(id, i)));
            for b in 0..bases.len() {
                prop_assert_eq!(
                    h.ctx.is_derived(ident(id, b), ident(id, i)),
                    above.contains(&b),
                    "is_derived(id{}, id{})", b, i
                );
            }
        }
    }

    /// A derived-from chain a <- b <- c implies a <- c.
    #[test]
    fn derivation_is_transitive(bases in hierarchy()) {
        let (h, id) = load(&bases);
        let n = bases.len();
        for a in 0..n {
            for b in 0..n {
                for c in 0..n {
                    if h.ctx.is_derived(ident(id, a), ident(id, b))
                        && h.ctx.is_derived(ident(id, b), ident(id, c))
                    {
                        prop_assert!(h.ctx.is_derived(ident(id, a), ident(id, c)));
                    }
                }
            }
        }
    }

    /// A leaf accepts exactly the identities derived from its base, and an
    /// accepted value prints back to its canonical form.
    #[test]
    fn leaf_accepts_derived_identities(bases in hierarchy()) {
        let (h, id) = load(&bases);
        let expected = ancestors(&bases);
        let node = NodeId { module: id, index: 0 };
        let mut unres = Unres::new();

        for (i, above) in expected.iter().enumerate() {
            let value = format!("m:id{}", i);
            let result = store_value(&h.ctx, &h.plugins, node, RawValue::json(value.as_bytes()), &mut unres);
            prop_assert_eq!(result.is_ok(), above.contains(&0), "value {}", value);
            if let Ok(stored) = result {
                let printed = print_value(&h.ctx, &h.plugins, node, &stored, ValueFormat::Json, &PrefixData::Module(None)).unwrap();
                prop_assert_eq!(&*printed, value.as_str());

                let plugin = type_plugin(&h.ctx, &h.plugins, schema_node(&h.ctx, node).unwrap()).unwrap();
                let copy = plugin.duplicate(&h.ctx, &stored);
                prop_assert!(plugin.compare(&stored, &copy));
            }
        }
        prop_assert!(unres.is_empty());
    }

    /// Arbitrary input never panics in any value format. Accepted values
    /// print in every format, restore from their XML form and leave nothing
    /// interned once freed.
    #[test]
    fn store_never_panics(
        value in prop::collection::vec(any::<u8>(), 0..40),
        hints in any::<u32>(),
        format in 0u8..4,
    ) {
        let (h, id) = load(&[vec![], vec![0]]);
        let node = NodeId { module: id, index: 0 };
        let namespaces = yangplug_schema::XmlNamespaces::new().with_default("urn:tests:m");
        let mut unres = Unres::new();

        let result = match format {
            0 => store_value(&h.ctx, &h.plugins, node, with_hints(RawValue::json(Cow::Owned(value)), hints), &mut unres),
            1 => store_value(&h.ctx, &h.plugins, node, with_hints(RawValue::xml(Cow::Owned(value), &namespaces), hints), &mut unres),
            2 => store_value(&h.ctx, &h.plugins, node, with_hints(RawValue::canonical(Cow::Owned(value)), hints), &mut unres),
            _ => store_lyb_value(&h.ctx, &h.plugins, node, &value, &mut unres),
        };
        let Ok(stored) = result else {
            return Ok(());
        };
        let canonical = stored.canonical.to_string();

        for (format, prefix_data) in [
            (ValueFormat::Canonical, PrefixData::Module(None)),
            (ValueFormat::Json, PrefixData::Module(None)),
            (ValueFormat::Schema, PrefixData::Schema(id)),
        ] {
            prop_assert!(print_value(&h.ctx, &h.plugins, node, &stored, format, &prefix_data).is_ok());
        }
        prop_assert!(print_lyb_value(&h.ctx, &h.plugins, node, &stored).is_ok());

        let xml = print_value(&h.ctx, &h.plugins, node, &stored, ValueFormat::Xml, &PrefixData::Xml(&namespaces)).unwrap();
        let restored = store_value(&h.ctx, &h.plugins, node, RawValue::xml(Cow::Borrowed(xml.as_bytes()), &namespaces), &mut unres).unwrap();
        prop_assert_eq!(restored.canonical.as_str(), canonical.as_str());

        free_value(&h.ctx, &h.plugins, node, restored);
        free_value(&h.ctx, &h.plugins, node, stored);
        prop_assert!(!h.ctx.dict().contains(&canonical));
    }
}

fn with_hints<'a, 'v>(raw: RawValue<'a, 'v>, hints: u32) -> RawValue<'a, 'v> {
    RawValue {
        hints: ValueHints::from_bits_truncate(hints),
        ..raw
    }
}
