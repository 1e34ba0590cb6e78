// tests/property/fan_out.rs

use cycledag::catalog::fanout::{hour_groups, member_groups, partition};
use proptest::prelude::*;

proptest! {
    #[test]
    fn partition_covers_domain_in_order(len in 1usize..200, groups in 0usize..50) {
        let domain: Vec<usize> = (0..len).collect();
        let parts = partition(&domain, groups);

        prop_assert_eq!(parts.len(), groups.clamp(1, len));
        let flat: Vec<usize> = parts.iter().flatten().copied().collect();
        prop_assert_eq!(flat, domain);
    }

    #[test]
    fn partition_sizes_differ_by_at_most_one_leading_first(len in 1usize..200, groups in 1usize..50) {
        let domain: Vec<usize> = (0..len).collect();
        let sizes: Vec<usize> = partition(&domain, groups).iter().map(Vec::len).collect();

        prop_assert!(sizes.iter().all(|&s| s > 0));
        prop_assert!(sizes.windows(2).all(|w| w[0] >= w[1] && w[0] - w[1] <= 1));
    }

    #[test]
    fn hour_group_anchors_are_group_maxima(
        hours in proptest::collection::btree_set(0i64..400, 1..60),
        groups in 1usize..12,
    ) {
        let hours: Vec<i64> = hours.into_iter().collect();
        let g = hour_groups(&hours, groups);

        prop_assert_eq!(g.labels.len(), g.anchors.len());
        prop_assert_eq!(g.labels.len(), g.lists.len());
        for (anchor, list) in g.anchors.iter().zip(&g.lists) {
            prop_assert!(list.ends_with(anchor.as_str()));
        }
        let last = format!("f{:03}", hours[hours.len() - 1]);
        prop_assert_eq!(g.anchors.last(), Some(&last));
    }

    #[test]
    fn member_groups_are_consecutive(members in 0u32..200, per_group in 0u32..40, first in 0u32..2) {
        let labels = member_groups(members, per_group, first);

        prop_assert!(!labels.is_empty());
        prop_assert_eq!(labels[0].clone(), format!("{first:02}"));
        for (i, label) in labels.iter().enumerate() {
            prop_assert_eq!(label.parse::<u32>().unwrap(), first + i as u32);
        }
    }
}
