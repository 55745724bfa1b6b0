//! 行程文档导出：PDF 与 HTML

use markdown::Options;

use crate::error::{PlannerError, PlannerResult};

mod pdf;

pub use pdf::PdfExporter;

/// 文档导出器，将Markdown行程文本转换为可下载的字节流
pub trait DocumentExporter: Send + Sync {
    fn export(&self, document: &str) -> PlannerResult<Vec<u8>>;
}

/// 渲染带样式的HTML页面
pub fn render_html(title: &str, document: &str) -> PlannerResult<String> {
    let body = markdown::to_html_with_options(document, &Options::gfm())
        .map_err(|e| PlannerError::Render(e.to_string()))?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8" />
  <title>{}</title>
  <style>
    body {{ font-family: Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; max-width: 820px; margin: 40px auto; padding: 0 20px; }}
    h1 {{ color: #0056b3; border-bottom: 2px solid #0056b3; padding-bottom: 6px; }}
    h2 {{ color: #007bff; margin-top: 28px; }}
    h3 {{ color: #17a2b8; }}
    ul, ol {{ padding-left: 24px; }}
    table {{ border-collapse: collapse; width: 100%; }}
    th, td {{ border: 1px solid #ddd; padding: 6px 10px; text-align: left; }}
    code {{ background: #f4f4f4; padding: 2px 4px; border-radius: 3px; }}
  </style>
</head>
<body>
{}
</body>
</html>
"#,
        escape_html(title),
        body
    ))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
