/// Generate Markdown documentation for the public API surface
pub fn generate_markdown_docs() -> String {
    let mut markdown = String::new();

    // Header
    markdown.push_str("# Wallet Wealth API Documentation\n\n");
    markdown.push_str("## Overview\n\n");
    markdown.push_str("Backend for the Wallet Wealth advisory site. It proxies chat turns to an external LLM provider, persists consultation bookings, serves admin reads gated by a shared secret, and exposes stock quotes for the portfolio widgets.\n\n");

    // Table of Contents
    markdown.push_str("## Table of Contents\n\n");
    markdown.push_str("- [Chat](#chat)\n");
    markdown.push_str("- [Appointments](#appointments)\n");
    markdown.push_str("- [Market Data](#market-data)\n");
    markdown.push_str("- [Health](#health)\n");
    markdown.push_str("- [Admin Authentication](#admin-authentication)\n");
    markdown.push_str("- [Error Codes](#error-codes)\n\n");

    // Base URL
    markdown.push_str("## Base URL\n\n");
    markdown.push_str("```\nhttp://localhost:8080\n```\n\n");

    // Chat endpoints
    markdown.push_str("## Chat\n\n");

    markdown.push_str("### POST /api/chat\n\n");
    markdown.push_str("**Description:** Send a message to the AI advisor and get a reply. Used directly, and as the fallback when the websocket channel is unavailable.\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"message\": \"How should I plan for retirement?\",\n  \"session_id\": \"optional-client-generated-id\"\n}\n```\n\n");
    markdown.push_str("**Response:**\n```json\n{\n  \"response\": \"...advisor reply...\",\n  \"session_id\": \"uuid\",\n  \"timestamp\": \"2024-01-01T00:00:00Z\",\n  \"provider\": \"groq\"\n}\n```\n\n");
    markdown.push_str("When every configured provider fails the endpoint still returns 200 with a fixed apology message.\n\n");

    markdown.push_str("### GET /api/chat/ws/{session_id}\n\n");
    markdown.push_str("**Description:** WebSocket chat channel. The first frame must be `{\"token\": \"...\"}`; the server replies with `{\"type\": \"auth_success\"}`. Each `{\"message\": \"...\"}` frame is answered with a `typing` start frame, a `message` frame and a `typing` stop frame, strictly one turn at a time.\n\n");

    // Appointment endpoints
    markdown.push_str("## Appointments\n\n");

    markdown.push_str("### POST /api/appointments/book\n\n");
    markdown.push_str("**Description:** Book a consultation (public, no auth). The record is created with status `pending` and server-side timestamps.\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"name\": \"Priya Raman\",\n  \"email\": \"priya@example.com\",\n  \"phone\": \"9940116967\",\n  \"service_type\": \"Tax Planning\",\n  \"preferred_date\": \"2099-01-01\",\n  \"preferred_time\": \"10:00 AM\",\n  \"message\": \"optional free text\"\n}\n```\n\n");
    markdown.push_str("**Response:**\n```json\n{\n  \"appointment\": { \"id\": \"uuid\", \"status\": \"pending\", \"...\": \"...\" },\n  \"message\": \"Thank you Priya Raman! ...\"\n}\n```\n\n");

    markdown.push_str("### GET /api/appointments?admin_token=...\n\n");
    markdown.push_str("**Description:** List appointments, newest first (admin only). Supports `status`, `limit` (max 100) and `offset` query parameters.\n\n");

    markdown.push_str("### GET /api/appointments/stats?admin_token=...\n\n");
    markdown.push_str("**Description:** Counts by status (admin only).\n\n");
    markdown.push_str("**Response:**\n```json\n{\n  \"total\": 12,\n  \"pending\": 7,\n  \"confirmed\": 3,\n  \"completed\": 1,\n  \"cancelled\": 1\n}\n```\n\n");

    markdown.push_str("### GET /api/appointments/{id}?admin_token=...\n\n");
    markdown.push_str("**Description:** Single appointment details (admin only).\n\n");

    markdown.push_str("### PATCH /api/appointments/{id}?admin_token=...\n\n");
    markdown.push_str("**Description:** Update appointment status and/or admin notes (admin only). All other fields are immutable.\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"status\": \"confirmed\",\n  \"admin_notes\": \"called back, confirmed for Monday\"\n}\n```\n\n");

    // Market data
    markdown.push_str("## Market Data\n\n");
    markdown.push_str("### GET /api/market/quote/{symbol}\n\n");
    markdown.push_str("**Description:** Current quote for a stock symbol (e.g. `RELIANCE.NS`). Quotes are cached for 5 minutes; without a market data key the service returns mock quotes with `\"source\": \"mock\"`.\n\n");

    // Health
    markdown.push_str("## Health\n\n");
    markdown.push_str("### GET /health\n\n");
    markdown.push_str("**Description:** Detailed health check covering the API, the database and the LLM configuration.\n\n");

    // Admin auth
    markdown.push_str("## Admin Authentication\n\n");
    markdown.push_str("Admin reads take a static shared secret as the `admin_token` query parameter:\n\n");
    markdown.push_str("```http\nGET /api/appointments?admin_token=<secret>\n```\n\n");
    markdown.push_str("There are no sessions and no token expiry; a wrong or missing token always yields 401.\n\n");

    // Error codes
    markdown.push_str("## Error Codes\n\n");
    markdown.push_str("| Status | Meaning |\n|--------|---------|\n");
    markdown.push_str("| 400 | Validation error (missing/invalid booking fields, bad chat message) |\n");
    markdown.push_str("| 401 | Bad or missing admin token |\n");
    markdown.push_str("| 404 | Appointment not found |\n");
    markdown.push_str("| 429 | Rate limit exceeded |\n");
    markdown.push_str("| 502 | Upstream provider failure (market data) |\n");
    markdown.push_str("| 500 | Internal/persistence error |\n\n");
    markdown.push_str("Error bodies are `{\"error\": \"<message>\"}`.\n");

    markdown
}

/// Generate the HTML documentation landing page
pub fn generate_documentation_html() -> String {
    let html = r#"
<!DOCTYPE html>
<html>
<head>
    <title>Wallet Wealth API Documentation</title>
    <meta charset="utf-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        body { font-family: 'Segoe UI', Arial, sans-serif; margin: 0; padding: 0; background: #f5f7fa; }
        .container { max-width: 900px; margin: 0 auto; padding: 2rem; }
        h1 { color: #1a3c6e; }
        .section { background: #fff; border-radius: 8px; padding: 1.5rem; margin-bottom: 1.5rem; box-shadow: 0 1px 3px rgba(0,0,0,0.08); }
        .endpoint { border-left: 3px solid #1a3c6e; padding: 0.5rem 1rem; margin: 1rem 0; }
        .method { display: inline-block; padding: 2px 8px; border-radius: 4px; color: #fff; font-size: 0.8rem; font-weight: bold; }
        .get { background: #2e7d32; }
        .post { background: #1565c0; }
        .patch { background: #ef6c00; }
        .ws { background: #6a1b9a; }
        .description { color: #444; margin-top: 0.3rem; }
        .auth-note { color: #b71c1c; font-size: 0.85rem; margin-top: 0.3rem; }
        .links a { margin-right: 1rem; }
        .footer { color: #888; font-size: 0.85rem; text-align: center; margin-top: 2rem; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Wallet Wealth API</h1>
        <div class="section links">
            <a href="/api/docs">Swagger UI</a>
            <a href="/api/redoc">Redoc</a>
            <a href="/docs/openapi.json">OpenAPI JSON</a>
            <a href="/docs/markdown">Markdown</a>
        </div>

        <div class="section">
            <h2>Chat</h2>
            <div class="endpoint">
                <h3><span class="method post">POST</span> /api/chat</h3>
                <div class="description">Send a message to the AI advisor; request/response fallback channel.</div>
            </div>
            <div class="endpoint">
                <h3><span class="method ws">WS</span> /api/chat/ws/{session_id}</h3>
                <div class="description">Real-time chat channel. First frame authenticates with {"token": ...}.</div>
            </div>
        </div>

        <div class="section">
            <h2>Appointments</h2>
            <div class="endpoint">
                <h3><span class="method post">POST</span> /api/appointments/book</h3>
                <div class="description">Book a consultation. Public, no auth; new records start pending.</div>
            </div>
            <div class="endpoint">
                <h3><span class="method get">GET</span> /api/appointments</h3>
                <div class="description">List appointments, newest first.</div>
                <div class="auth-note">Requires admin_token query parameter</div>
            </div>
            <div class="endpoint">
                <h3><span class="method get">GET</span> /api/appointments/stats</h3>
                <div class="description">Counts by status for the admin dashboard.</div>
                <div class="auth-note">Requires admin_token query parameter</div>
            </div>
            <div class="endpoint">
                <h3><span class="method get">GET</span> /api/appointments/{id}</h3>
                <div class="description">Single appointment details.</div>
                <div class="auth-note">Requires admin_token query parameter</div>
            </div>
            <div class="endpoint">
                <h3><span class="method patch">PATCH</span> /api/appointments/{id}</h3>
                <div class="description">Update status/admin notes; everything else is immutable.</div>
                <div class="auth-note">Requires admin_token query parameter</div>
            </div>
        </div>

        <div class="section">
            <h2>Market Data</h2>
            <div class="endpoint">
                <h3><span class="method get">GET</span> /api/market/quote/{symbol}</h3>
                <div class="description">Current quote for a stock symbol, cached for 5 minutes.</div>
            </div>
        </div>

        <div class="section">
            <h2>Health</h2>
            <div class="endpoint">
                <h3><span class="method get">GET</span> /health</h3>
                <div class="description">API, database and LLM health.</div>
            </div>
        </div>

        <div class="footer">
            <p>This documentation is auto-generated and stays in sync with the codebase.</p>
        </div>
    </div>
</body>
</html>
    "#;

    html.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_covers_every_endpoint() {
        let markdown = generate_markdown_docs();
        for endpoint in [
            "POST /api/chat",
            "GET /api/chat/ws/{session_id}",
            "POST /api/appointments/book",
            "GET /api/appointments?admin_token=...",
            "GET /api/appointments/stats?admin_token=...",
            "PATCH /api/appointments/{id}?admin_token=...",
            "GET /api/market/quote/{symbol}",
            "GET /health",
        ] {
            assert!(markdown.contains(endpoint), "missing {}", endpoint);
        }
    }
}
