#[cfg(test)]
mod searched_at_parsing_tests {
    use crate::parser::parse_ts_candidate;
    use chrono::{TimeZone, Timelike, Utc};

    struct TimestampTestCase {
        input: &'static str,
        description: &'static str,
        expected: Option<(i32, u32, u32, u32, u32, u32)>,
    }

    const TEST_CASES: &[TimestampTestCase] = &[
        TimestampTestCase {
            input: "2024-03-01T10:15:30Z",
            description: "RFC 3339 with Z",
            expected: Some((2024, 3, 1, 10, 15, 30)),
        },
        TimestampTestCase {
            input: "2024-03-01T17:15:30+07:00",
            description: "RFC 3339 with positive offset",
            expected: Some((2024, 3, 1, 10, 15, 30)),
        },
        TimestampTestCase {
            input: "2024-03-01T17:15:30.250000+0700",
            description: "offset without colon",
            expected: Some((2024, 3, 1, 10, 15, 30)),
        },
        TimestampTestCase {
            input: "2024-03-01T10:15:30.123456",
            description: "naive isoformat with microseconds, read as UTC",
            expected: Some((2024, 3, 1, 10, 15, 30)),
        },
        TimestampTestCase {
            input: "2024-03-01 10:15:30",
            description: "naive with space separator",
            expected: Some((2024, 3, 1, 10, 15, 30)),
        },
        TimestampTestCase {
            input: "1709288130",
            description: "epoch seconds",
            expected: Some((2024, 3, 1, 10, 15, 30)),
        },
        TimestampTestCase {
            input: "1709288130000",
            description: "epoch millis",
            expected: Some((2024, 3, 1, 10, 15, 30)),
        },
        TimestampTestCase {
            input: "yesterday",
            description: "free text is rejected",
            expected: None,
        },
        TimestampTestCase {
            input: "12345",
            description: "short number is rejected",
            expected: None,
        },
        TimestampTestCase {
            input: "",
            description: "empty string is rejected",
            expected: None,
        },
    ];

    #[test]
    fn searched_at_formats() {
        for case in TEST_CASES {
            let got = parse_ts_candidate(case.input);
            match case.expected {
                Some((y, mo, d, h, mi, s)) => {
                    let want = Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap();
                    let got = got.unwrap_or_else(|| panic!("{}: failed to parse {:?}", case.description, case.input));
                    assert_eq!(got.with_nanosecond(0).unwrap(), want, "{}", case.description);
                }
                None => assert!(got.is_none(), "{}: unexpectedly parsed {:?}", case.description, case.input),
            }
        }
    }

    #[test]
    fn fractional_seconds_are_kept() {
        let ts = parse_ts_candidate("2024-03-01T10:15:30.123456").unwrap();
        assert_eq!(ts.nanosecond(), 123_456_000);
        let ts = parse_ts_candidate("1709288130123").unwrap();
        assert_eq!(ts.nanosecond(), 123_000_000);
    }
}
