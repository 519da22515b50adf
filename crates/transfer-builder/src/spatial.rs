use rstar::{RTree, RTreeObject, AABB};

/// A stop as seen by the spatial index: just enough to range-query and then
/// re-fetch the full row if ever needed. Indexed on `(lon, lat)` since
/// `rstar`'s `AABB` is dimension-order-agnostic but we keep it consistent
/// with the `(x, y)` convention used elsewhere in the geo ecosystem.
#[derive(Debug, Clone)]
pub struct IndexedStop {
    pub stop_id: String,
    pub lat: f64,
    pub lon: f64,
}

impl RTreeObject for IndexedStop {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lon, self.lat])
    }
}

pub fn build_index(stops: Vec<IndexedStop>) -> RTree<IndexedStop> {
    RTree::bulk_load(stops)
}
