//! Relay pages
//!
//! Small same-origin HTML documents that carry out the browser half of each
//! auth step: replaying deferred `sessionStorage`/`localStorage` writes and
//! moving on. Data reaches the script as JSON with `<` escaped, so nothing
//! embedded can close the `<script>` element.

use platform::storage::ClientStorageOp;
use serde::Serialize;

use crate::application::client_store::{PKCE_STATE_KEY, PKCE_VERIFIER_KEY, SESSION_COPY_KEY};
use crate::error::{AuthError, AuthResult};

const APPLY_OPS: &str = r#"
function storeFor(medium) {
  try {
    return medium === "sessionStorage" ? window.sessionStorage : window.localStorage;
  } catch (e) {
    return null;
  }
}
function applyOps(ops) {
  for (const op of ops) {
    const store = storeFor(op.medium);
    if (!store) continue;
    try {
      if (op.op === "set") store.setItem(op.key, op.value);
      else store.removeItem(op.key);
    } catch (e) {}
  }
}
"#;

/// Session copy reads and writes shared by every page. A copy counts only
/// while `Date.now()` is strictly before its `expiresAt`; expired or corrupt
/// copies are dropped and a surviving one is written back to the stores
/// ahead of it.
const SESSION_COPY: &str = r#"
const SESSION_MEDIA = ["sessionStorage", "localStorage"];
function isSessionValid(session) {
  return !!session && typeof session.expiresAt === "number" && Date.now() < session.expiresAt;
}
function getSession() {
  for (let i = 0; i < SESSION_MEDIA.length; i++) {
    const store = storeFor(SESSION_MEDIA[i]);
    if (!store) continue;
    let session = null;
    try {
      const raw = store.getItem(SESSION_KEY);
      if (!raw) continue;
      session = JSON.parse(raw);
    } catch (e) {}
    if (!isSessionValid(session)) {
      try { store.removeItem(SESSION_KEY); } catch (e) {}
      continue;
    }
    const copy = JSON.stringify(session);
    applyOps(SESSION_MEDIA.slice(0, i).map((medium) => ({ op: "set", medium, key: SESSION_KEY, value: copy })));
    return session;
  }
  return null;
}
function setSession(session) {
  const copy = JSON.stringify(session);
  applyOps(SESSION_MEDIA.map((medium) => ({ op: "set", medium, key: SESSION_KEY, value: copy })));
}
function clearSession() {
  applyOps(SESSION_MEDIA.map((medium) => ({ op: "remove", medium, key: SESSION_KEY })));
}
window.portalSession = { get: getSession, set: setSession, clear: clearSession, isValid: isSessionValid };
"#;

fn script_json<T: Serialize>(value: &T) -> AuthResult<String> {
    serde_json::to_string(value)
        .map(|json| json.replace('<', "\\u003c"))
        .map_err(|e| AuthError::Internal(format!("page data: {e}")))
}

fn document(title: &str, script: &str, fallback_href: Option<&str>) -> String {
    let noscript = fallback_href
        .map(|href| {
            format!(
                "<noscript><a href=\"{}\">Continue</a></noscript>",
                href.replace('&', "&amp;").replace('"', "&quot;")
            )
        })
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"referrer\" content=\"no-referrer\">\n<title>{title}</title>\n</head>\n\
         <body>\n{noscript}\n<script>\nconst SESSION_KEY = \"{SESSION_COPY_KEY}\";{APPLY_OPS}{SESSION_COPY}{script}</script>\n</body>\n</html>\n"
    )
}

/// `base` with an `error` query parameter appended
pub fn with_error(base: &str, code: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}error={code}")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginData<'a> {
    ops: &'a [ClientStorageOp],
    authorization_url: &'a str,
}

/// Persist PKCE in the browser stores, then go to the provider
pub fn login_page(ops: &[ClientStorageOp], authorization_url: &str) -> AuthResult<String> {
    let data = script_json(&LoginData {
        ops,
        authorization_url,
    })?;
    let script = format!(
        "const data = {data};\napplyOps(data.ops);\nwindow.location.replace(data.authorizationUrl);\n"
    );
    Ok(document("Signing in", &script, Some(authorization_url)))
}

/// What the callback page needs to finish the exchange
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackData<'a> {
    /// PKCE pair the server could still see, if any
    pub code_verifier: Option<&'a str>,
    pub expected_state: Option<&'a str>,
    pub ops: &'a [ClientStorageOp],
    pub success_url: &'a str,
    pub missing_pkce_url: String,
    pub failure_url: String,
}

/// Forward the callback URL and PKCE pair to `complete`, replicate the
/// echoed session, then land on the success page
pub fn callback_page(data: &CallbackData<'_>) -> AuthResult<String> {
    let data = script_json(data)?;
    let script = format!(
        r#"const data = {data};
const keys = {{ verifier: "{PKCE_VERIFIER_KEY}", state: "{PKCE_STATE_KEY}" }};
function lookup(key) {{
  for (const medium of ["sessionStorage", "localStorage"]) {{
    const store = storeFor(medium);
    try {{
      const value = store && store.getItem(key);
      if (value) return value;
    }} catch (e) {{}}
  }}
  return null;
}}
const codeVerifier = data.codeVerifier || lookup(keys.verifier);
const expectedState = data.expectedState || lookup(keys.state);
applyOps(data.ops);
for (const medium of ["sessionStorage", "localStorage"]) {{
  const store = storeFor(medium);
  try {{
    if (store) {{ store.removeItem(keys.verifier); store.removeItem(keys.state); }}
  }} catch (e) {{}}
}}
if (!codeVerifier || !expectedState) {{
  window.location.replace(data.missingPkceUrl);
}} else {{
  fetch("complete", {{
    method: "POST",
    credentials: "same-origin",
    headers: {{ "Content-Type": "application/json" }},
    body: JSON.stringify({{ callbackUrl: window.location.href, codeVerifier, expectedState }})
  }})
    .then((response) => {{
      if (!response.ok) throw new Error("complete: " + response.status);
      return response.json();
    }})
    .then((body) => {{
      if (isSessionValid(body.session)) setSession(body.session);
      window.location.replace(data.successUrl);
    }})
    .catch(() => window.location.replace(data.failureUrl));
}}
"#
    );
    Ok(document("Completing sign in", &script, None))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogoutData<'a> {
    ops: &'a [ClientStorageOp],
    home_url: &'a str,
}

/// Drop every client-side copy, then go home
pub fn logout_page(ops: &[ClientStorageOp], home_url: &str) -> AuthResult<String> {
    let data = script_json(&LogoutData { ops, home_url })?;
    let script = format!("const data = {data};\napplyOps(data.ops);\nwindow.location.replace(data.homeUrl);\n");
    Ok(document("Signing out", &script, Some(home_url)))
}
