use crate::core::geometry;
use crate::core::model::{Region, RegionId, RegionSet};

/// Candidate correspondence between one reference and one hypothesis region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub ref_id: RegionId,
    pub hyp_id: RegionId,
    pub strength: f64,
}

/// Link strength of two regions: the squared coverage ratio of each side,
/// summed. Zero when the regions do not overlap.
pub fn link_strength(a: &Region, b: &Region) -> f64 {
    let overlap = geometry::area(&geometry::intersection(&a.shape, &b.shape));
    if overlap <= 0.0 {
        return 0.0;
    }
    (overlap / a.area).powi(2) + (overlap / b.area).powi(2)
}

/// All links with positive strength, enumerated reference-major.
pub fn compute_links(refs: &RegionSet, hyps: &RegionSet) -> Vec<Link> {
    let mut links = Vec::new();
    for reference in refs.iter() {
        for hypothesis in hyps.iter() {
            let strength = link_strength(reference, hypothesis);
            if strength > 0.0 {
                links.push(Link {
                    ref_id: reference.id,
                    hyp_id: hypothesis.id,
                    strength,
                });
            }
        }
    }
    links
}

/// Orders links by decreasing strength. The sort is stable, so equal
/// strengths keep their enumeration order.
pub fn sort_links(links: &mut [Link]) {
    links.sort_by(|a, b| b.strength.total_cmp(&a.strength));
}

pub fn sorted_links(refs: &RegionSet, hyps: &RegionSet) -> Vec<Link> {
    let mut links = compute_links(refs, hyps);
    sort_links(&mut links);
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::BBox;

    fn set(boxes: &[(RegionId, BBox)]) -> RegionSet {
        boxes.iter().map(|(id, bbox)| (*id, bbox.to_shape())).collect()
    }

    #[test]
    fn identical_regions_have_strength_two() {
        let refs = set(&[(1, BBox::new(0.0, 0.0, 10.0, 10.0))]);
        let hyps = set(&[(9, BBox::new(0.0, 0.0, 10.0, 10.0))]);
        let links = compute_links(&refs, &hyps);
        assert_eq!(links.len(), 1);
        assert!((links[0].strength - 2.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_pairs_are_not_linked() {
        let refs = set(&[(1, BBox::new(0.0, 0.0, 10.0, 10.0))]);
        let hyps = set(&[(1, BBox::new(20.0, 20.0, 30.0, 30.0))]);
        assert!(compute_links(&refs, &hyps).is_empty());
    }

    #[test]
    fn ties_keep_document_order() {
        let refs = set(&[(1, BBox::new(0.0, 0.0, 10.0, 10.0))]);
        let hyps = set(&[
            (4, BBox::new(5.0, 0.0, 10.0, 10.0)),
            (3, BBox::new(0.0, 0.0, 5.0, 10.0)),
            (8, BBox::new(0.0, 0.0, 10.0, 10.0)),
        ]);
        let links = sorted_links(&refs, &hyps);
        let order: Vec<_> = links.iter().map(|link| link.hyp_id).collect();
        // Equal strengths follow insertion order, not numeric id order.
        assert_eq!(order, vec![8, 4, 3]);
        assert!((links[1].strength - 1.25).abs() < 1e-9);
    }
}
