fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use coreup_protocol::frame::Frame;
    use coreup_protocol::messages::{InstallRequest, InstallResult, ProgressEnvelope};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn load_fixture_text(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let data = load_fixture_text(name);
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and
    /// compares the JSON values (order-independent comparison).
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  Rust:    {reserialized}"
        );
    }

    /// Decodes a fixture frame and re-encodes it, asserting the wire
    /// arrays are identical element for element.
    fn frame_roundtrip_test(name: &str) -> Frame {
        let fixture = load_fixture(name);
        let text = load_fixture_text(name);
        let frame = Frame::decode(&text)
            .unwrap_or_else(|e| panic!("failed to decode frame {name}: {e}"));
        let encoded = frame
            .encode()
            .unwrap_or_else(|e| panic!("failed to encode frame {name}: {e}"));
        let reserialized: serde_json::Value = serde_json::from_str(&encoded)
            .unwrap_or_else(|e| panic!("re-encoded frame {name} is not JSON: {e}"));
        assert_eq!(
            fixture, reserialized,
            "frame roundtrip mismatch for {name}:\n  fixture: {fixture}\n  Rust:    {reserialized}"
        );
        frame
    }

    // --- Domain payload fixtures ---

    #[test]
    fn fixture_install_request_kwargs() {
        roundtrip_test::<InstallRequest>("install_request_kwargs.json");
    }

    #[test]
    fn fixture_install_request_matches_builder() {
        let fixture = load_fixture("install_request_kwargs.json");
        let built = InstallRequest::for_package("core.dnp.dappnode.eth");
        assert_eq!(serde_json::to_value(&built).unwrap(), fixture);
    }

    #[test]
    fn fixture_install_result_success() {
        roundtrip_test::<InstallResult>("install_result_success.json");
    }

    #[test]
    fn fixture_install_result_failure() {
        roundtrip_test::<InstallResult>("install_result_failure.json");
        let fixture = load_fixture("install_result_failure.json");
        let result: InstallResult = serde_json::from_value(fixture).unwrap();
        assert!(!result.success);
        assert_eq!(
            result.message.as_deref(),
            Some("Could not fetch package manifest")
        );
    }

    #[test]
    fn fixture_progress_event_kwargs() {
        roundtrip_test::<ProgressEnvelope>("progress_event_kwargs.json");
    }

    #[test]
    fn fixture_progress_event_clear() {
        let fixture = load_fixture("progress_event_clear.json");
        let envelope: ProgressEnvelope = serde_json::from_value(fixture).unwrap();
        assert!(envelope.data.clear);
    }

    // --- Backward compatibility: publishers that omit `clear` ---

    #[test]
    fn legacy_progress_log_without_clear() {
        let json = r#"{
            "data": {
                "name": "core.dnp.dappnode.eth",
                "message": "Copying files"
            }
        }"#;
        let envelope: ProgressEnvelope = serde_json::from_str(json).unwrap();
        assert!(!envelope.data.clear, "missing clear should default to false");
    }

    // --- WAMP frame fixtures ---

    #[test]
    fn fixture_hello_frame() {
        let frame = frame_roundtrip_test("hello_frame.json");
        let Frame::Hello { realm, .. } = frame else {
            panic!("expected HELLO");
        };
        assert_eq!(realm, "dappnode_admin");
    }

    #[test]
    fn fixture_welcome_frame() {
        let frame = frame_roundtrip_test("welcome_frame.json");
        let Frame::Welcome { session_id, .. } = frame else {
            panic!("expected WELCOME");
        };
        assert_eq!(session_id, 3_835_123_450);
    }

    #[test]
    fn fixture_subscribe_frame() {
        let frame = frame_roundtrip_test("subscribe_frame.json");
        let Frame::Subscribe { topic, .. } = frame else {
            panic!("expected SUBSCRIBE");
        };
        assert_eq!(topic, "log.dappmanager.dnp.dappnode.eth");
    }

    #[test]
    fn fixture_goodbye_frame() {
        let frame = frame_roundtrip_test("goodbye_frame.json");
        let Frame::Goodbye { reason, .. } = frame else {
            panic!("expected GOODBYE");
        };
        assert_eq!(reason, "wamp.close.system_shutdown");
    }

    #[test]
    fn fixture_install_call_frame() {
        let frame = frame_roundtrip_test("install_call_frame.json");
        let Frame::Call {
            procedure,
            args,
            kwargs,
            ..
        } = frame
        else {
            panic!("expected CALL");
        };
        assert_eq!(procedure, "installPackage.dappmanager.dnp.dappnode.eth");
        assert!(args.is_empty(), "install call carries kwargs only");

        // The kwargs on the wire are exactly the install request payload.
        let request: InstallRequest =
            serde_json::from_value(kwargs.unwrap()).expect("kwargs decode as InstallRequest");
        assert_eq!(request, InstallRequest::for_package("core.dnp.dappnode.eth"));
    }

    #[test]
    fn fixture_result_frame_carries_encoded_reply() {
        let frame = frame_roundtrip_test("result_frame.json");
        let Frame::Result { args, .. } = frame else {
            panic!("expected RESULT");
        };

        // Reply arrives as a JSON-encoded string inside the frame.
        let raw = args[0].as_str().expect("first positional result is a string");
        let result = InstallResult::decode(raw).unwrap();
        assert!(result.success);
        assert_eq!(result.message.as_deref(), Some("Successfully updated core"));
    }

    #[test]
    fn fixture_error_frame() {
        let frame = frame_roundtrip_test("error_frame.json");
        let Frame::Error {
            request_type,
            error,
            args,
            kwargs,
            ..
        } = frame
        else {
            panic!("expected ERROR");
        };
        assert_eq!(request_type, 48, "error refers to a CALL request");
        assert_eq!(error, "wamp.error.runtime_error");

        // The same human message is duplicated in args[0] and
        // kwargs.message; normalization prefers the kwargs message.
        let call_error =
            coreup_protocol::CallError::new(error, args, kwargs.as_ref());
        assert_eq!(call_error.normalized(), "Could not resolve request");
    }

    #[test]
    fn fixture_event_frame() {
        let frame = frame_roundtrip_test("event_frame.json");
        let Frame::Event { kwargs, .. } = frame else {
            panic!("expected EVENT");
        };
        let envelope: ProgressEnvelope =
            serde_json::from_value(kwargs.unwrap()).expect("kwargs decode as ProgressEnvelope");
        assert_eq!(
            envelope.data.display_line(),
            "core.dnp.dappnode.eth: Loading restart mechanism"
        );
    }
}
