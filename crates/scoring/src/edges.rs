/// Keep only the first step of every contiguous run of detections.
///
/// Position 0 is always `false`: with no previous step there is no onset to see.
pub fn rising_edges(detections: &[bool]) -> Vec<bool> {
    let mut edges = vec![false; detections.len()];
    for y in 1..detections.len() {
        edges[y] = detections[y] && !detections[y - 1];
    }
    edges
}
