use std::sync::OnceLock;

use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::json;

use super::ToolContext;
use crate::errors::ToolResult;
use crate::models::tool::Tool;

const USER_AGENT: &str = "Mozilla/5.0";

pub fn search_web_tool() -> Tool {
    Tool::new(
        "search_web",
        "Search the internet and return the first relevant result",
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query"}
            },
            "required": ["query"]
        }),
    )
}

#[derive(Debug, Deserialize)]
pub struct SearchWebArgs {
    pub query: String,
}

pub async fn search_web(ctx: &ToolContext, args: SearchWebArgs) -> ToolResult<String> {
    let page = ctx
        .client
        .get(&ctx.search_url)
        .query(&[("q", args.query.as_str())])
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await?
        .text()
        .await?;

    match first_result(&page) {
        Some((title, link)) => Ok(format!("Top result: {}\nLink: {}", title, link)),
        None => Ok("No relevant results found.".to_string()),
    }
}

/// Title and href of the first `result__a` anchor on a results page
fn first_result(page: &str) -> Option<(String, String)> {
    static RESULT_LINK: OnceLock<Selector> = OnceLock::new();
    let selector = RESULT_LINK
        .get_or_init(|| Selector::parse("a.result__a").expect("valid selector"));

    let document = Html::parse_document(page);
    let anchor = document.select(selector).next()?;
    let link = anchor.value().attr("href")?;
    let title = anchor.text().collect::<String>();

    Some((title.trim().to_string(), link.to_string()))
}
