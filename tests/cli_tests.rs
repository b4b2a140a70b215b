#[cfg(test)]
mod tests {
    use beatclockrs::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn devices() -> Vec<String> {
        vec![
            "USB MIDI Interface [Output]".to_string(),
            "Midi Through [Output]".to_string(),
        ]
    }

    #[test]
    fn test_args_without_flags() {
        let args = Args::parse_from(["test"]);
        assert!(!args.list_devices);
        assert!(!args.select_device);
        assert_eq!(args.midi_out, None);
        assert_eq!(args.short_press, None);
    }

    #[test]
    fn test_args_with_devices() {
        let args = Args::parse_from([
            "test",
            "--midi-out",
            "USB MIDI",
            "--midi-in",
            "Keystep",
            "--list-devices",
        ]);
        assert_eq!(args.midi_out, Some("USB MIDI".to_string()));
        assert_eq!(args.midi_in, Some("Keystep".to_string()));
        assert!(args.list_devices);
    }

    #[test]
    fn test_args_with_device_options() {
        let args = Args::parse_from([
            "test",
            "--settings",
            "/tmp/beat.bin",
            "--short-press",
            "ignore",
            "--poll-interval-ms",
            "5",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.settings, Some(PathBuf::from("/tmp/beat.bin")));
        assert_eq!(args.short_press.as_deref(), Some("ignore"));
        assert_eq!(args.poll_interval_ms, Some(5));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_args_reject_bad_interval() {
        assert!(Args::try_parse_from(["test", "--poll-interval-ms", "soon"]).is_err());
    }

    #[test]
    fn test_valid_device_binding() {
        assert!(validate_device("USB MIDI", &devices()).is_ok());
    }

    #[test]
    fn test_invalid_device_binding() {
        let err = validate_device("Nonexistent Device", &devices()).unwrap_err();
        assert!(err.contains("Nonexistent Device"));
        assert!(err.contains("  - Midi Through [Output]"));
    }
}
