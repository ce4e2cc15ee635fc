#[cfg(test)]
mod tests {
    use std::io::Write;
    use tempfile::NamedTempFile;

    use crate::config::VariableCatalogFormat;
    use crate::core::EventKind;
    use crate::error::CatalogError;
    use crate::parsing::variable_catalog::{parse_variable_catalog, read_variable_catalog};
    use crate::time::JulianDate;

    const MANUAL: &str = "\
name,comments,v,ra,dec,epoch,period,amplitude,ocrange,phase
RR Lyr,bright RR Lyrae,7.1,19:25:27.9,+42:47:04,2459000.5,0.566805,0.9,10,0.5
X Cyg,,6.4,20:43:24.2,+35:35:16,,,,,
,orphan,9.0,01:00:00,+10:00:00,,,,,
BadDec,,9.0,01:00:00,north,,,,,
";

    const AAVSO: &str = "\
Star Name,Notes,Max Mag,Min Mag,RA (J2000.0),Dec (J2000.0),Period (d)
SS Cyg,Dwarf nova,7.7 V,12.4 V,21:42:42.8,+43:35:10,
R Leo,,4.4,11.3,09:47:33.5,+11:25:44,309.95
";

    #[test]
    fn test_manual_rows_with_defaults() {
        let stars = parse_variable_catalog(MANUAL, VariableCatalogFormat::Auto).unwrap();
        assert_eq!(stars.len(), 2);

        let rr = &stars[0];
        assert_eq!(rr.name, "RR Lyr");
        assert_eq!(rr.comments.as_deref(), Some("bright RR Lyrae"));
        assert!(rr.has_events());
        assert_eq!(rr.amplitude, 0.9);
        assert_eq!(rr.oc_range_minutes, 10.0);
        assert_eq!(rr.phase, 0.5);

        let x = &stars[1];
        assert!(!x.has_events());
        assert_eq!(x.amplitude, 1.0);
        assert_eq!(x.epoch, 0.0);
        assert_eq!(x.comments, None);
    }

    #[test]
    fn test_aavso_rows() {
        let stars = parse_variable_catalog(AAVSO, VariableCatalogFormat::Auto).unwrap();
        assert_eq!(stars.len(), 2);
        assert_eq!(stars[0].name, "SS Cyg");
        assert_eq!(stars[0].magnitude, 7.7);
        assert!((stars[0].amplitude - 4.7).abs() < 1e-9);
        assert_eq!(stars[0].period, 0.0);
        assert_eq!(stars[1].period, 309.95);
        assert!(stars.iter().all(|s| !s.has_events()));
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let text = "NAME,RA,DEC,V\nT Cep,21:09:31.8,+68:29:27,5.2\n";
        let stars = parse_variable_catalog(text, VariableCatalogFormat::Auto).unwrap();
        assert_eq!(stars.len(), 1);
        assert_eq!(stars[0].magnitude, 5.2);
    }

    #[test]
    fn test_unknown_header_is_an_error() {
        let result = parse_variable_catalog("foo,bar\n1,2\n", VariableCatalogFormat::Auto);
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_periodic_event_from_record() {
        let stars = parse_variable_catalog(MANUAL, VariableCatalogFormat::Manual).unwrap();
        let rr = &stars[0];
        let event = rr.periodic_event(2460000.0, 60.0).unwrap();

        let shifted = 2459000.5 + 0.566805 * 0.5;
        let cycle = ((2460000.0 - shifted) / 0.566805_f64).floor();
        let next = shifted + 0.566805 * (cycle + 1.0);
        assert!((event.mid().value() - next).abs() < 1e-9);
        assert!(event.mid().value() > 2460000.0);
        assert!((event.end().value() - event.mid().value() - 70.0 / 1440.0).abs() < 1e-9);
        assert_eq!(event.comments(), Some("bright RR Lyrae"));
        assert!(event.has_periodic_events());
    }

    #[test]
    fn test_all_night_event_from_record() {
        let stars = parse_variable_catalog(MANUAL, VariableCatalogFormat::Manual).unwrap();
        let times = [
            JulianDate::new(2460000.3),
            JulianDate::new(2460000.5),
            JulianDate::new(2460000.7),
        ];
        let event = stars[1].all_night_event(times).unwrap();
        assert!(matches!(event.kind(), EventKind::AllNight { amplitude } if *amplitude == 1.0));
        assert_eq!(event.start(), times[0]);
    }

    #[test]
    fn test_read_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(AAVSO.as_bytes()).unwrap();
        let stars = read_variable_catalog(file.path(), VariableCatalogFormat::Aavso).unwrap();
        assert_eq!(stars.len(), 2);

        let missing = read_variable_catalog(
            std::path::Path::new("/nonexistent/catalog.csv"),
            VariableCatalogFormat::Auto,
        );
        assert!(matches!(missing, Err(CatalogError::FileNotFound(_))));
    }
}
