use super::{BoundingBox, GeoBoundsError, GeoPoint, Grid, math};

fn bbox(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> BoundingBox {
    BoundingBox::new(GeoPoint::new(min_lat, min_lon), GeoPoint::new(max_lat, max_lon)).unwrap()
}

#[test]
fn test_haversine_known_distance() {
    // Paris CDG -> London LHR is roughly 348 km.
    let cdg = GeoPoint::new(49.0097, 2.5479);
    let lhr = GeoPoint::new(51.4700, -0.4543);
    let d = cdg.haversine_km(&lhr);
    assert!((d - 348.0).abs() < 5.0, "got {d}");
    assert!((d - lhr.haversine_km(&cdg)).abs() < 1e-9);
    assert!(cdg.haversine_km(&cdg).abs() < 1e-12);
}

#[test]
fn test_bbox_rejects_unordered_and_out_of_range() {
    let unordered = BoundingBox::new(GeoPoint::new(10.0, 5.0), GeoPoint::new(5.0, 10.0));
    assert_eq!(unordered.unwrap_err(), GeoBoundsError::Unordered);
    let out = BoundingBox::new(GeoPoint::new(-91.0, 0.0), GeoPoint::new(0.0, 10.0));
    assert_eq!(out.unwrap_err(), GeoBoundsError::OutOfRange);
    let nan = BoundingBox::new(GeoPoint::new(f64::NAN, 0.0), GeoPoint::new(0.0, 10.0));
    assert_eq!(nan.unwrap_err(), GeoBoundsError::OutOfRange);
}

#[test]
fn test_bbox_intersection_and_overlap() {
    let scene = bbox(0.0, 0.0, 10.0, 10.0);
    let half_in = bbox(5.0, 0.0, 15.0, 10.0);
    let outside = bbox(20.0, 20.0, 30.0, 30.0);

    let shared = scene.intersection(&half_in).unwrap();
    assert_eq!(shared, bbox(5.0, 0.0, 10.0, 10.0));
    assert!((half_in.overlap_ratio(&scene) - 0.5).abs() < 1e-12);
    assert!(scene.intersection(&outside).is_none());
    assert!(outside.overlap_ratio(&scene).abs() < f64::EPSILON);

    // a point-sized box touching the scene counts as fully covered
    let point = bbox(3.0, 3.0, 3.0, 3.0);
    assert!((point.overlap_ratio(&scene) - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_bbox_enclosing() {
    let pts = [GeoPoint::new(1.0, 4.0), GeoPoint::new(-2.0, 7.0), GeoPoint::new(3.0, 5.0)];
    let b = BoundingBox::enclosing(pts.iter()).unwrap();
    assert_eq!(b, bbox(-2.0, 4.0, 3.0, 7.0));
    assert!(BoundingBox::enclosing(std::iter::empty::<&GeoPoint>()).is_none());
}

#[test]
fn test_grid_layout() {
    let g = Grid::from_fn(3, 2, |x, y| x + 10 * y);
    assert_eq!(g.cells(), &[0, 1, 2, 10, 11, 12]);
    assert_eq!(g.get(2, 1), 12);
    assert_eq!(g.get_checked(-1, 0), None);
    assert_eq!(g.get_checked(3, 0), None);
    assert_eq!(g.get_checked(1, 1), Some(11));
    assert!(Grid::from_vec(2, 2, vec![1, 2, 3]).is_none());
    assert_eq!(g.map(|v| v * 2).get(1, 1), 22);
}

#[test]
fn test_piecewise_linear_clamps() {
    let knots: [(f64, f64); 3] = [(8000.0, 0.9), (10000.0, 1.0), (12000.0, 1.2)];
    assert!((math::piecewise_linear(&knots, 7000.0).unwrap() - 0.9).abs() < 1e-12);
    assert!((math::piecewise_linear(&knots, 9000.0).unwrap() - 0.95).abs() < 1e-12);
    assert!((math::piecewise_linear(&knots, 11000.0).unwrap() - 1.1).abs() < 1e-12);
    assert!((math::piecewise_linear(&knots, 20000.0).unwrap() - 1.2).abs() < 1e-12);
    assert!(math::piecewise_linear::<f64>(&[], 1.0).is_none());
    assert!(math::normalize(1.0, 2.0, 2.0).is_none());
    assert!((math::sigmoid(0.0) - 0.5).abs() < f32::EPSILON);
}
