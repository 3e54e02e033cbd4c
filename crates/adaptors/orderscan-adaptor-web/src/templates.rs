//! HTML pages, rendered with handlebars (values are HTML-escaped)

use handlebars::Handlebars;
use orderscan_core::{OrderScanError, Result};
use serde::Serialize;

const HEAD_PARTIAL: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{title}}</title>
  <style>
    :root { --bg:#f8fafc; --panel:#ffffff; --accent:#2563eb; --text:#0f172a; --muted:#64748b; --ok:#15803d; --bad:#b91c1c; }
    body { margin:0; background:var(--bg); color:var(--text); font-family: Inter, system-ui, -apple-system, Segoe UI, Roboto, sans-serif; }
    main { max-width: 1100px; margin: 0 auto; padding: 24px; }
    h1 { font-size: 26px; margin: 0 0 16px; }
    .panel { background:var(--panel); border:1px solid #e2e8f0; border-radius:12px; padding:16px 20px; margin-bottom:16px; }
    .muted { color:var(--muted); font-size:14px; }
    .steps { list-style:none; padding:0; margin:0; }
    .steps li { padding:4px 0; }
    .step-done::before { content:"\2713  "; color:var(--ok); font-weight:700; }
    .step-failed::before { content:"\2717  "; color:var(--bad); font-weight:700; }
    .step-skipped::before { content:"\2013  "; color:var(--muted); }
    .banner { background:#dcfce7; color:var(--ok); border-radius:8px; padding:10px 14px; font-weight:600; }
    .failure { background:#fee2e2; color:var(--bad); border:1px solid #fecaca; border-radius:8px; padding:10px 14px; white-space:pre-wrap; }
    .downloads a { display:inline-block; margin-right:12px; padding:10px 16px; border-radius:8px; background:var(--accent); color:#fff; text-decoration:none; font-weight:600; }
    textarea { width:100%; min-height:320px; font-family: ui-monospace, Menlo, Consolas, monospace; font-size:13px; border:1px solid #cbd5e1; border-radius:8px; padding:10px; box-sizing:border-box; }
    .table-wrap { overflow-x:auto; }
    table { border-collapse:collapse; font-size:13px; }
    th, td { border:1px solid #e2e8f0; padding:6px 8px; text-align:left; white-space:nowrap; }
    th { background:#f1f5f9; }
    button { padding:10px 18px; border-radius:8px; border:0; background:var(--accent); color:#fff; font-weight:600; cursor:pointer; }
  </style>
</head>
<body>
<main>
"#;

const INDEX_TEMPLATE: &str = r#"{{> head title="Purchase Order Analysis"}}
  <h1>Purchase Order Analysis</h1>
  <div class="panel">
    <form method="post" action="/analyze" enctype="multipart/form-data">
      <p>Upload a PDF purchase order to get a detailed analysis and the extracted order fields.</p>
      <p><input type="file" name="file" accept=".pdf,application/pdf" required></p>
      <p class="muted">Maximum upload size: {{max_upload_mb}} MB.</p>
      <button type="submit">Analyze</button>
    </form>
  </div>
</main>
</body>
</html>
"#;

const RESULTS_TEMPLATE: &str = r#"{{> head title=source}}
  <h1>Purchase Order Analysis</h1>
  <div class="panel">
    <div class="muted">{{source}}{{#if stats}} &middot; {{stats.page_count}} pages &middot; {{stats.word_count}} words{{/if}}</div>
    <ul class="steps">
      {{#each steps}}<li class="step-{{status}}">{{label}}</li>
      {{/each}}
    </ul>
  </div>
  <div class="banner">Analysis completed</div>
  {{#each failures}}
  <div class="failure">{{this}}</div>
  {{/each}}
  <div class="panel downloads">
    {{#if summary_download}}<a href="{{{summary_download}}}" download="{{summary_filename}}">Download analysis (.txt)</a>{{/if}}
    {{#if csv_download}}<a href="{{{csv_download}}}" download="{{csv_filename}}">Download fields (.csv)</a>{{/if}}
    <a href="/" style="background:#475569">Analyze another file</a>
  </div>
  {{#if table}}
  <div class="panel">
    <h2>Extracted fields</h2>
    <div class="table-wrap">
      <table>
        <thead><tr>{{#each table.header}}<th>{{this}}</th>{{/each}}</tr></thead>
        <tbody><tr>{{#each table.row}}<td>{{this}}</td>{{/each}}</tr></tbody>
      </table>
    </div>
  </div>
  {{/if}}
  {{#if summary_text}}
  <div class="panel">
    <h2>Detailed analysis</h2>
    <textarea readonly>{{summary_text}}</textarea>
  </div>
  {{/if}}
</main>
</body>
</html>
"#;

const ERROR_TEMPLATE: &str = r#"{{> head title="Upload rejected"}}
  <h1>Purchase Order Analysis</h1>
  <div class="failure">{{message}}</div>
  <p><a href="/">Back to upload</a></p>
</main>
</body>
</html>
"#;

/// Registered page templates
pub struct Pages {
    handlebars: Handlebars<'static>,
}

impl Pages {
    /// Register every page
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars
            .register_partial("head", HEAD_PARTIAL)
            .map_err(|e| OrderScanError::template(e.to_string()))?;
        for (name, source) in [
            ("index", INDEX_TEMPLATE),
            ("results", RESULTS_TEMPLATE),
            ("error", ERROR_TEMPLATE),
        ] {
            handlebars
                .register_template_string(name, source)
                .map_err(|e| OrderScanError::template(e.to_string()))?;
        }
        Ok(Self { handlebars })
    }

    /// Render page `name`
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        self.handlebars
            .render(name, data)
            .map_err(|e| OrderScanError::template(e.to_string()))
    }
}
