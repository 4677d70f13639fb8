//! Proptest strategies for protocol records.

use proptest::prelude::*;
use std::collections::BTreeSet;

use skybridge_core::{Capability, FeatureRequest, RequestRecord};

/// Strategy for an arbitrary subset of the capability vocabulary.
pub fn capability_set() -> impl Strategy<Value = BTreeSet<Capability>> {
    proptest::collection::vec(any::<bool>(), Capability::ALL.len()).prop_map(|mask| {
        Capability::ALL
            .iter()
            .zip(mask)
            .filter(|(_, keep)| *keep)
            .map(|(cap, _)| *cap)
            .collect()
    })
}

/// Strategy for a full request record.
pub fn request_record() -> impl Strategy<Value = RequestRecord> {
    (
        any::<bool>(),
        capability_set(),
        proptest::option::of("[a-z][a-z0-9-]{0,15}"),
    )
        .prop_map(|(want_credentials, capabilities, label)| RequestRecord {
            want_credentials,
            capabilities,
            label,
        })
}

/// Strategy for a partial feature request.
pub fn feature_request() -> impl Strategy<Value = FeatureRequest> {
    (
        proptest::option::of(any::<bool>()),
        proptest::option::of(capability_set()),
        proptest::option::of("[a-z][a-z0-9-]{0,15}"),
    )
        .prop_map(|(want_credentials, capabilities, label)| FeatureRequest {
            want_credentials,
            capabilities,
            label,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        // Merging any sequence of partial requests must agree with the
        // last-present-value-wins contract field by field.
        #[test]
        fn prop_merge_is_field_wise_overwrite(
            base in request_record(),
            updates in proptest::collection::vec(feature_request(), 0..6),
        ) {
            let mut merged = base.clone();
            for update in &updates {
                update.apply_to(&mut merged);
            }

            let expect_credentials = updates
                .iter()
                .rev()
                .find_map(|u| u.want_credentials)
                .unwrap_or(base.want_credentials);
            let expect_caps = updates
                .iter()
                .rev()
                .find_map(|u| u.capabilities.clone())
                .unwrap_or(base.capabilities);
            let expect_label = updates
                .iter()
                .rev()
                .find_map(|u| u.label.clone())
                .or(base.label);

            prop_assert_eq!(merged.want_credentials, expect_credentials);
            prop_assert_eq!(merged.capabilities, expect_caps);
            prop_assert_eq!(merged.label, expect_label);
        }

        // Hash equality must coincide with record equality.
        #[test]
        fn prop_hash_agrees_with_equality(a in request_record(), b in request_record()) {
            prop_assert_eq!(a == b, a.content_hash() == b.content_hash());
        }
    }
}
