//! Conversion of strip and fan topologies to triangle lists.

/// Convert a triangle strip to a triangle list.
///
/// Handles degenerate triangles (where two or more indices are the same).
#[must_use]
pub fn strip_to_triangles(strip: &[u32]) -> Vec<u32> {
    if strip.len() < 3 {
        return Vec::new();
    }

    let mut triangles = Vec::with_capacity((strip.len() - 2) * 3);

    for (i, window) in strip.windows(3).enumerate() {
        let [a, b, c] = [window[0], window[1], window[2]];

        // Skip degenerate triangles.
        if a == b || b == c || a == c {
            continue;
        }

        // Alternate winding order for triangle strips.
        if i % 2 == 0 {
            triangles.extend([a, b, c]);
        } else {
            triangles.extend([b, a, c]);
        }
    }

    triangles
}

/// Convert a triangle fan to a triangle list.
#[must_use]
pub fn fan_to_triangles(fan: &[u32]) -> Vec<u32> {
    let Some((&hub, rest)) = fan.split_first() else {
        return Vec::new();
    };

    rest.windows(2)
        .filter(|w| w[0] != w[1] && w[0] != hub && w[1] != hub)
        .flat_map(|w| [hub, w[0], w[1]])
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_strip_alternates_winding() {
        assert_eq!(
            strip_to_triangles(&[0, 1, 2, 3, 4]),
            vec![0, 1, 2, 2, 1, 3, 2, 3, 4]
        );
    }

    #[test]
    fn test_strip_skips_degenerates() {
        assert_eq!(strip_to_triangles(&[0, 1, 1, 2]), Vec::<u32>::new());
        assert_eq!(strip_to_triangles(&[0, 1]), Vec::<u32>::new());
    }

    #[test]
    fn test_fan() {
        assert_eq!(fan_to_triangles(&[0, 1, 2, 3]), vec![0, 1, 2, 0, 2, 3]);
        assert!(fan_to_triangles(&[]).is_empty());
        assert!(fan_to_triangles(&[0, 1]).is_empty());
    }

    proptest! {
        #[test]
        fn test_outputs_are_whole_triangles(indices in prop::collection::vec(0u32..8, 0..32)) {
            for triangles in [strip_to_triangles(&indices), fan_to_triangles(&indices)] {
                prop_assert_eq!(triangles.len() % 3, 0);
                prop_assert!(triangles.iter().all(|i| indices.contains(i)));
                for tri in triangles.chunks(3) {
                    prop_assert!(tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2]);
                }
            }
        }
    }
}
