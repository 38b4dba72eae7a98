use phish_relay::*;

#[test]
fn test_gmail_forward_without_blank_after_subject() {
    let text = "Please check this\n\n\
                -----Forwarded message-----\n\
                From: billing@evil.example\n\
                Subject: Pay now\n\
                Date: Mon, 1 Jan 2024\n\
                \n\
                Click http://evil.example/pay?id=1 now!";

    let fwd = detect_forwarded_message(text).expect("forward should be detected");

    assert_eq!(fwd.style, ForwardStyle::Gmail);
    assert_eq!(fwd.from.as_deref(), Some("billing@evil.example"));
    assert_eq!(fwd.subject.as_deref(), Some("Pay now"));
    assert_eq!(fwd.date.as_deref(), Some("Mon, 1 Jan 2024"));
    assert_eq!(fwd.to, None);
    assert!(!fwd.content.contains("Forwarded message"));
    assert!(fwd.content.starts_with("From: billing@evil.example"));
    assert!(fwd.content.ends_with("Click http://evil.example/pay?id=1 now!"));
}

#[test]
fn test_gmail_forward_body_after_subject() {
    let text = "---------- Forwarded message ---------\n\
                From: Support <support@bank.example>\n\
                To: me@example.com\n\
                Date: Tue, 2 Jan 2024\n\
                Subject: Verify your account\n\
                \n\
                Body here";

    let fwd = detect_forwarded_message(text).unwrap();

    assert_eq!(fwd.style, ForwardStyle::Gmail);
    assert_eq!(fwd.from.as_deref(), Some("Support <support@bank.example>"));
    assert_eq!(fwd.to.as_deref(), Some("me@example.com"));
    assert_eq!(fwd.subject.as_deref(), Some("Verify your account"));
    assert_eq!(fwd.content, "Body here");
}

#[test]
fn test_gmail_forward_crlf() {
    let text = "---------- Forwarded message ---------\r\n\
                From: a@evil.example\r\n\
                Subject: Hi\r\n\
                \r\n\
                Body here\r\n";

    let fwd = detect_forwarded_message(text).unwrap();

    assert_eq!(fwd.from.as_deref(), Some("a@evil.example"));
    assert_eq!(fwd.subject.as_deref(), Some("Hi"));
    assert_eq!(fwd.content, "Body here");
}

#[test]
fn test_apple_forward() {
    let text = "Sent from my iPhone\n\n\
                Begin forwarded message:\n\n\
                From: Bank <alerts@bank.example>\n\
                Subject: Verify\n\
                Date: today\n\
                To: me@example.com\n\
                \n\
                Please verify at https://bank.example.evil/login\n\n\n\n\
                Thanks";

    let fwd = detect_forwarded_message(text).unwrap();

    assert_eq!(fwd.style, ForwardStyle::AppleOutlook);
    assert_eq!(fwd.from.as_deref(), Some("Bank <alerts@bank.example>"));
    assert_eq!(fwd.to.as_deref(), Some("me@example.com"));
    assert_eq!(fwd.subject.as_deref(), Some("Verify"));
    assert_eq!(
        fwd.content,
        "Please verify at https://bank.example.evil/login\n\nThanks"
    );
}

#[test]
fn test_apple_forward_without_blank_line_has_empty_content() {
    let text = "Begin forwarded message:\nFrom: a@b.example\nSubject: x";

    let fwd = detect_forwarded_message(text).unwrap();

    assert_eq!(fwd.style, ForwardStyle::AppleOutlook);
    assert_eq!(fwd.from.as_deref(), Some("a@b.example"));
    assert_eq!(fwd.content, "");
}

#[test]
fn test_apple_marker_case_insensitive() {
    let text = "BEGIN FORWARDED MESSAGE:\n\nFrom: x@evil.example\n\nHello there";

    let fwd = detect_forwarded_message(text).unwrap();

    assert_eq!(fwd.style, ForwardStyle::AppleOutlook);
    assert_eq!(fwd.content, "Hello there");
}

#[test]
fn test_generic_forward() {
    let text = "FYI\n\n\
                From: scam@evil.example\n\
                Sent: Monday\n\
                To: victim@example.com\n\
                Subject: Urgent\n\
                \n\
                Wire money now";

    let fwd = detect_forwarded_message(text).unwrap();

    assert_eq!(fwd.style, ForwardStyle::Generic);
    assert_eq!(fwd.from.as_deref(), Some("scam@evil.example"));
    assert_eq!(fwd.to.as_deref(), Some("victim@example.com"));
    assert_eq!(fwd.subject.as_deref(), Some("Urgent"));
    assert_eq!(fwd.content, "Wire money now");
}

#[test]
fn test_generic_requires_from_before_subject() {
    let text = "Subject: Hello\nFrom: someone@example.com\n\nbody";

    assert!(detect_forwarded_message(text).is_none());
}

#[test]
fn test_gmail_takes_precedence() {
    let text = "Begin forwarded message:\n\n\
                ---------- Forwarded message ---------\n\
                From: first@evil.example\n\
                Subject: One\n\
                \n\
                Body";

    let fwd = detect_forwarded_message(text).unwrap();

    assert_eq!(fwd.style, ForwardStyle::Gmail);
}

#[test]
fn test_no_forward() {
    assert!(detect_forwarded_message("").is_none());
    assert!(detect_forwarded_message("Hi, just a normal note about lunch.").is_none());
}

#[test]
fn test_extract_header_value() {
    let text = "subject:  Hello World  \nFrom: x@example.com";

    assert_eq!(
        extract_header_value(text, "Subject").as_deref(),
        Some("Hello World")
    );
    assert_eq!(
        extract_header_value(text, "FROM").as_deref(),
        Some("x@example.com")
    );
    assert_eq!(extract_header_value(text, "Date"), None);
}

#[test]
fn test_extract_header_value_anchored_and_folded() {
    let text = "X-Subject: nope\nSubject: first line\n second line";

    assert_eq!(
        extract_header_value(text, "Subject").as_deref(),
        Some("first line")
    );
}

#[test]
fn test_extract_header_value_empty_is_absent() {
    let text = "Subject:   \nFrom: a@example.com";

    assert_eq!(extract_header_value(text, "Subject"), None);
}

#[test]
fn test_extract_header_value_other_names() {
    let text = "Reply-To: reply@evil.example\nX.Tag: dotted\nXYTag: plain\nCC: cc@example.com";

    assert_eq!(
        extract_header_value(text, "reply-to").as_deref(),
        Some("reply@evil.example")
    );
    assert_eq!(extract_header_value(text, "X.Tag").as_deref(), Some("dotted"));
    assert_eq!(extract_header_value(text, "Cc").as_deref(), Some("cc@example.com"));
    assert_eq!(extract_header_value("XYTag: plain", "X.Tag"), None);
}

#[test]
fn test_extract_header_value_repeated_calls() {
    let text = "From: a@example.com\nTo: b@example.com\nDate: today";

    for _ in 0..3 {
        assert_eq!(extract_header_value(text, "from").as_deref(), Some("a@example.com"));
        assert_eq!(extract_header_value(text, "To").as_deref(), Some("b@example.com"));
        assert_eq!(extract_header_value(text, "DATE").as_deref(), Some("today"));
        assert_eq!(extract_header_value(text, "Subject"), None);
    }
}
