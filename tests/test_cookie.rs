use wicket::http::cookie::{Cookie, find_cookie};

#[test]
fn test_cookie_all_fields_serialized() {
    let cookie = Cookie::new("sid", "ABCDEF")
        .domain("example.com")
        .path("/")
        .max_age(3600)
        .http_only();

    assert_eq!(
        cookie.to_string(),
        "sid=\"ABCDEF\"; Domain=example.com; Path=/; Max-Age=3600; HttpOnly"
    );
}

#[test]
fn test_cookie_minimal_omits_optional_fields() {
    let cookie = Cookie::new("theme", "dark");
    let line = cookie.to_string();

    assert_eq!(line, "theme=\"dark\"");
    assert!(!line.contains("Domain"));
    assert!(!line.contains("Path"));
    assert!(!line.contains("Max-Age"));
    assert!(!line.contains("HttpOnly"));
}

#[test]
fn test_cookie_partial_fields() {
    let line = Cookie::new("a", "b").path("/docs").to_string();
    assert_eq!(line, "a=\"b\"; Path=/docs");

    let line = Cookie::new("a", "b").max_age(0).to_string();
    assert_eq!(line, "a=\"b\"; Max-Age=0");
}

#[test]
fn test_cookie_accessors() {
    let cookie = Cookie::new("n", "v").domain("d").path("/p").max_age(5).http_only();

    assert_eq!(cookie.name(), "n");
    assert_eq!(cookie.value(), "v");
    assert_eq!(cookie.get_domain(), Some("d"));
    assert_eq!(cookie.get_path(), Some("/p"));
    assert_eq!(cookie.get_max_age(), Some(5));
    assert!(cookie.is_http_only());
}

#[test]
fn test_find_cookie_among_pairs() {
    assert_eq!(find_cookie("a=1; sid=XYZ; b=2", "sid"), Some("XYZ"));
    assert_eq!(find_cookie("sid=XYZ", "sid"), Some("XYZ"));
    assert_eq!(find_cookie("a=1;b=2", "sid"), None);
}

#[test]
fn test_find_cookie_strips_quotes() {
    assert_eq!(find_cookie("sid=\"QUOTED\"", "sid"), Some("QUOTED"));
    assert_eq!(find_cookie("x=1; sid=\"Q\" ", "sid"), Some("Q"));
}

#[test]
fn test_find_cookie_requires_exact_name() {
    assert_eq!(find_cookie("xsid=1; sidx=2", "sid"), None);
    assert_eq!(find_cookie("novalue; sid=OK", "sid"), Some("OK"));
}
