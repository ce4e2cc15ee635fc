#[cfg(test)]
mod tests {
    use crate::algorithms::matching::*;
    use crate::algorithms::projection::{PixelPoint, SkyProjection};
    use crate::core::Coordinates;
    use crate::parsing::ReferenceStar;

    fn star(x: f64, y: f64, average: f64) -> DetectedStar {
        DetectedStar {
            position: PixelPoint::new(x, y),
            average_brightness: average,
            max_brightness: average * 4.0,
            background: 900.0,
            hfr: 2.1,
        }
    }

    fn projection() -> SkyProjection {
        SkyProjection::new(Coordinates::new(5.0, 20.0).unwrap(), 0.0, 1.0, 2000, 1000)
    }

    /// Sky position that projects close to the given pixel (north up, 1"/px).
    fn sky_at(x: f64, y: f64) -> Coordinates {
        let dec = 20.0 + (500.0 - y) / 3600.0;
        let ra_hours = 5.0 - (x - 1000.0) / 3600.0 / 15.0 / dec.to_radians().cos();
        Coordinates::new(ra_hours, dec).unwrap()
    }

    fn reference(name: &str, x: f64, y: f64) -> ReferenceStar {
        ReferenceStar {
            name: name.to_string(),
            coordinates: sky_at(x, y),
            magnitude: None,
        }
    }

    #[test]
    fn test_nearest_star_by_squared_distance() {
        let point = PixelPoint::new(100.0, 100.0);
        let stars = [star(105.0, 100.0, 1.0), star(100.0, 101.0, 2.0), star(109.0, 100.0, 3.0)];
        let nearest = nearest_star(&point, &stars).unwrap();
        assert_eq!(nearest.average_brightness, 2.0);
    }

    #[test]
    fn test_nearest_star_tie_keeps_first() {
        let point = PixelPoint::new(0.0, 0.0);
        let stars = [star(3.0, 4.0, 1.0), star(-4.0, 3.0, 2.0)];
        assert_eq!(nearest_star(&point, &stars).unwrap().average_brightness, 1.0);
        assert!(nearest_star(&point, &[]).is_none());
    }

    #[test]
    fn test_match_rounds_and_checks_bounds() {
        let stars = [star(1000.4, 499.6, 50.0)];
        let matched = match_star(&sky_at(1000.0, 500.0), &projection(), &stars).unwrap();
        assert_eq!(matched.position, PixelPoint::new(1000.0, 500.0));

        // 2 degrees north is far above the frame
        let outside = Coordinates::new(5.0, 22.0).unwrap();
        assert!(match_star(&outside, &projection(), &stars).is_none());
    }

    #[test]
    fn test_priority_deduplication() {
        let detected = [
            star(1000.2, 500.1, 100.0), // target
            star(300.0, 200.0, 40.0),   // variable
            star(1500.0, 800.0, 60.0),  // simbad comparison
            star(1700.0, 300.0, 70.0),  // chart comparison
            star(600.0, 900.0, 103.0),  // similar brightness
            star(1800.0, 100.0, 104.9), // similar brightness
            star(50.0, 50.0, 106.0),    // too bright to be similar
        ];
        let references = ReferenceStars {
            variables: vec![reference("V1", 301.0, 201.0), reference("on target", 999.0, 501.0)],
            simbad_comparisons: vec![
                reference("S1", 1499.0, 799.0),
                reference("same as variable", 300.0, 202.0),
            ],
            chart_comparisons: vec![
                reference("C1", 1701.0, 299.0),
                reference("same as simbad", 1500.0, 801.0),
                reference("off frame", 2500.0, 300.0),
            ],
        };

        let field = correlate("TrES-5", &sky_at(1000.0, 500.0), &projection(), &detected, &references).unwrap();
        assert_eq!(field.target.name, "TrES-5");
        assert_eq!(field.target.star.position, PixelPoint::new(1000.0, 500.0));

        let names = |stars: &[MatchedStar]| stars.iter().map(|s| s.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&field.variables), vec!["V1"]);
        assert_eq!(names(&field.simbad_comparisons), vec!["S1"]);
        assert_eq!(names(&field.chart_comparisons), vec!["C1"]);
        assert_eq!(field.comparison_count(), 2);

        let similar: Vec<PixelPoint> = field.similar_brightness.iter().map(|s| s.star.position).collect();
        assert_eq!(similar, vec![PixelPoint::new(600.0, 900.0), PixelPoint::new(1800.0, 100.0)]);

        let classes: Vec<StarClass> = field.stars().map(|s| s.class).collect();
        assert_eq!(
            classes,
            vec![
                StarClass::Target,
                StarClass::Variable,
                StarClass::SimbadComparison,
                StarClass::ChartComparison,
                StarClass::SimilarBrightness,
                StarClass::SimilarBrightness,
            ]
        );
    }

    #[test]
    fn test_target_not_found() {
        let references = ReferenceStars::default();
        assert!(correlate("X", &sky_at(1000.0, 500.0), &projection(), &[], &references).is_none());
    }
}
