//! Request shield: flags paths and queries carrying common attack payloads.

use super::oracle::RequestFingerprint;

/// Attack class reported when a signature matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threat {
    PathTraversal,
    SqlInjection,
    ScriptInjection,
}

impl Threat {
    pub fn as_str(self) -> &'static str {
        match self {
            Threat::PathTraversal => "path-traversal",
            Threat::SqlInjection => "sql-injection",
            Threat::ScriptInjection => "script-injection",
        }
    }
}

const SIGNATURES: &[(&str, Threat)] = &[
    ("../", Threat::PathTraversal),
    ("..\\", Threat::PathTraversal),
    ("/etc/passwd", Threat::PathTraversal),
    ("\0", Threat::PathTraversal),
    ("' or '1'='1", Threat::SqlInjection),
    ("\" or \"1\"=\"1", Threat::SqlInjection),
    (" or 1=1", Threat::SqlInjection),
    ("union select", Threat::SqlInjection),
    ("; drop table", Threat::SqlInjection),
    ("'--", Threat::SqlInjection),
    ("sleep(", Threat::SqlInjection),
    ("<script", Threat::ScriptInjection),
    ("javascript:", Threat::ScriptInjection),
    ("onerror=", Threat::ScriptInjection),
    ("onload=", Threat::ScriptInjection),
];

/// Returns the first threat found in the request's path or query.
pub fn inspect(fingerprint: &RequestFingerprint) -> Option<Threat> {
    let mut haystack = percent_decode(&fingerprint.path);
    if let Some(query) = &fingerprint.query {
        haystack.push('?');
        haystack.push_str(&percent_decode(&query.replace('+', " ")));
    }
    let haystack = haystack.to_lowercase();

    SIGNATURES
        .iter()
        .find(|(needle, _)| haystack.contains(needle))
        .map(|(_, threat)| *threat)
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}
