use tracing::{debug, info};

use super::{EnrichmentError, Locale};
use crate::aggregator::AggregatedItem;
use crate::llm::{LlmHandle, LlmRequest};

/// Issue the single batched LLM call for `items` and return its raw text.
pub async fn request_enrichment(
    llm: &LlmHandle,
    items: &[AggregatedItem],
    category: &str,
    locale: Locale,
) -> Result<String, EnrichmentError> {
    let provider = llm.provider().ok_or(EnrichmentError::Unavailable)?;

    // Sampling settings come from the provider's configured defaults.
    let request = LlmRequest::new(build_prompt(items, category, locale));

    info!(category, items = items.len(), "requesting batched enrichment");
    let response = provider
        .generate(request)
        .await
        .map_err(|e| EnrichmentError::RequestFailed(format!("{:#}", e)))?;

    debug!(
        model = %response.model,
        total_tokens = response.usage.total_tokens,
        "enrichment response received"
    );
    Ok(response.content)
}

/// One prompt listing every item as `<index>. <title>`.
pub fn build_prompt(items: &[AggregatedItem], category: &str, locale: Locale) -> String {
    let titles = items
        .iter()
        .map(|item| format!("{}. {}", item.index, single_line(&item.title)))
        .collect::<Vec<_>>()
        .join("\n");

    match locale {
        Locale::Ja => format!(
            r#"あなたはニュース編集者です。以下の{count}件のニュース見出しそれぞれについて、要約とタグを作成してください。

# 指示
- 要約は40〜60文字程度で、その記事が何を報じているかを具体的に書くこと
- 見出しをそのまま繰り返さず、読者に役立つ情報を含めること
- タグは各ニュースに1〜3個、内容を表す短いキーワードにすること

# 出力形式
JSON配列のみを出力すること。配列以外の文章は一切含めないこと。
見出し1件につき1要素とし、"index" は見出しの番号と一致させること。
[
  {{"index": 0, "summary": "要約", "tags": ["タグ1", "タグ2"]}},
  {{"index": 1, "summary": "要約", "tags": ["タグ1"]}}
]

# カテゴリー
{category}

# 見出し一覧
{titles}

# JSON出力"#,
            count = items.len(),
            category = category,
            titles = titles,
        ),
        Locale::En => format!(
            r#"You are a news editor. For each of the {count} headlines below, write a summary and tags.

INSTRUCTIONS:
- Each summary is 40 to 60 characters and says concretely what the story reports
- Do not repeat the headline verbatim; add information useful to a reader
- Give 1 to 3 short keyword tags per headline

OUTPUT FORMAT:
Respond with a JSON array only. Include no text other than the array.
One object per headline; "index" must equal the headline number.
[
  {{"index": 0, "summary": "summary text", "tags": ["tag1", "tag2"]}},
  {{"index": 1, "summary": "summary text", "tags": ["tag1"]}}
]

CATEGORY: {category}

HEADLINES:
{titles}

JSON OUTPUT:"#,
            count = items.len(),
            category = category,
            titles = titles,
        ),
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::enrichment::test_support::{item, CannedProvider};
    use crate::llm::remote::RemoteLlmProvider;

    #[test]
    fn test_prompt_lists_every_item_by_index() {
        let items = vec![item(0, "First", ""), item(1, "Second\nline", ""), item(2, "Third", "")];

        let prompt = build_prompt(&items, "経済", Locale::Ja);

        assert!(prompt.contains("経済"));
        assert!(prompt.contains("3件"));
        assert!(prompt.contains("0. First\n1. Second line\n2. Third"));
        assert!(prompt.contains("JSON配列のみ"));
        assert!(prompt.contains("40〜60文字"));
    }

    #[test]
    fn test_english_prompt() {
        let items = vec![item(0, "Rates rise", "")];

        let prompt = build_prompt(&items, "Economy", Locale::En);

        assert!(prompt.contains("CATEGORY: Economy"));
        assert!(prompt.contains("0. Rates rise"));
        assert!(prompt.contains("JSON array only"));
        assert!(prompt.contains(r#"{"index": 0, "summary""#));
    }

    #[tokio::test]
    async fn test_unconfigured_llm_is_unavailable() {
        let items = vec![item(0, "First", "")];
        let err = request_enrichment(&LlmHandle::disabled(), &items, "経済", Locale::Ja)
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichmentError::Unavailable));
    }

    #[tokio::test]
    async fn test_one_call_for_whole_batch() {
        let provider = Arc::new(CannedProvider::replying("[]"));
        let handle = LlmHandle::with_provider(provider.clone());
        let items: Vec<_> = (0..10).map(|i| item(i, &format!("headline {}", i), "")).collect();

        let raw = request_enrichment(&handle, &items, "経済", Locale::Ja).await.unwrap();

        assert_eq!(raw, "[]");
        assert_eq!(provider.call_count(), 1);
        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("9. headline 9"));
    }

    #[tokio::test]
    async fn test_transport_error_is_request_failed() {
        let handle = LlmHandle::with_provider(Arc::new(CannedProvider::failing()));
        let items = vec![item(0, "First", "")];

        let err = request_enrichment(&handle, &items, "経済", Locale::Ja).await.unwrap_err();

        match err {
            EnrichmentError::RequestFailed(msg) => assert!(msg.contains("503")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_configured_temperature_reaches_provider() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"temperature": 0.25})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"model":"m","choices":[{"message":{"role":"assistant","content":"[]"}}]}"#)
            .expect(1)
            .create_async()
            .await;

        let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "m").with_defaults(30, 2048, 0.25);
        let handle = LlmHandle::with_provider(Arc::new(provider));
        let items = vec![item(0, "First", "")];

        let raw = request_enrichment(&handle, &items, "経済", Locale::Ja).await.unwrap();

        assert_eq!(raw, "[]");
        mock.assert_async().await;
    }
}
