use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::resources::dtos::{ResourceOwnerDto, ResourceResponseDto};
use crate::features::resources::models::Resource;
use crate::features::resources::ResourceService;
use crate::features::search::dtos::{AiSearchResultDto, KeywordExtraction, ResourceSummaries};
use crate::modules::ai::TextGenerator;
use crate::modules::storage::ObjectStore;
use crate::shared::constants::{
    AI_SEARCH_RESULT_LIMIT, AI_SEARCH_REVIEWS_PER_RESOURCE, AI_SUMMARY_FALLBACK,
};
use crate::shared::llm::{parse_with_fallback, LlmResponse};
use crate::shared::prompts::{render_keywords_prompt, render_summaries_prompt, SummaryPromptItem};
use crate::shared::types::contains_pattern;

const MAX_KEYWORDS: usize = 3;

#[derive(sqlx::FromRow)]
struct MatchRow {
    #[sqlx(flatten)]
    resource: Resource,
    owner_name: String,
    owner_profile_image: Option<String>,
    reviews_count: i64,
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    resource_id: Uuid,
    comment: String,
}

/// Split the raw query when the model gives nothing usable
pub fn fallback_keywords(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_string).collect()
}

/// Keyword search over resources, ranked by popularity and annotated with
/// model-written summaries. Model failures never fail a search.
pub struct SearchService {
    pool: PgPool,
    storage: Arc<dyn ObjectStore>,
    generator: Arc<dyn TextGenerator>,
}

impl SearchService {
    pub fn new(
        pool: PgPool,
        storage: Arc<dyn ObjectStore>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            pool,
            storage,
            generator,
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<AiSearchResultDto>> {
        let keywords = self.extract_keywords(query).await;
        debug!(?keywords, "Searching resources");

        let rows = self.find_resources(&keywords).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.resource.id).collect();
        let mut categories = ResourceService::categories_for(&self.pool, &ids).await?;
        let mut comments = self.approved_comments(&ids).await?;

        let items: Vec<SummaryPromptItem> = rows
            .iter()
            .map(|row| {
                let r = &row.resource;
                SummaryPromptItem::new(
                    r.id.to_string(),
                    r.title.clone(),
                    r.description.clone(),
                    &comments.remove(&r.id).unwrap_or_default(),
                )
            })
            .collect();
        let mut summaries = self.summarize(&items).await;

        let storage = self.storage.as_ref();
        let results: Vec<AiSearchResultDto> = rows
            .into_iter()
            .map(|row| {
                let owner = ResourceOwnerDto {
                    id: row.resource.user_id,
                    name: row.owner_name,
                    profile_image_url: row.owner_profile_image.as_deref().map(|k| storage.url(k)),
                };
                let links = categories.remove(&row.resource.id).unwrap_or_default();
                let ai_summary = summaries
                    .remove(&row.resource.id)
                    .unwrap_or_else(|| AI_SUMMARY_FALLBACK.to_string());
                AiSearchResultDto {
                    resource: ResourceResponseDto::from_parts(&row.resource, owner, links, storage),
                    reviews_count: row.reviews_count,
                    ai_summary,
                }
            })
            .collect();

        info!(matches = results.len(), "AI search completed");
        Ok(results)
    }

    /// Model keywords, or whitespace-split query words
    pub async fn extract_keywords(&self, query: &str) -> Vec<String> {
        let schema = KeywordExtraction::json_schema_string();
        let prompt = match render_keywords_prompt(query, MAX_KEYWORDS, &schema) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("Failed to render keyword prompt: {}", e);
                return fallback_keywords(query);
            }
        };

        let raw = match self.generator.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Keyword extraction failed: {}", e);
                return fallback_keywords(query);
            }
        };

        let parsed: KeywordExtraction = parse_with_fallback(&raw);
        if !parsed.is_success() {
            warn!(
                "Keyword extraction returned unusable output: {}",
                parsed.llm_error_message.unwrap_or_default()
            );
        }

        let keywords: Vec<String> = parsed
            .keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keywords.is_empty() {
            fallback_keywords(query)
        } else {
            keywords
        }
    }

    /// Summary per resource id. Missing or unparseable entries are left out.
    pub async fn summarize(&self, items: &[SummaryPromptItem]) -> HashMap<Uuid, String> {
        if items.is_empty() {
            return HashMap::new();
        }

        let schema = ResourceSummaries::json_schema_string();
        let prompt = match render_summaries_prompt(items, &schema) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("Failed to render summaries prompt: {}", e);
                return HashMap::new();
            }
        };

        let raw = match self.generator.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Summary generation failed: {}", e);
                return HashMap::new();
            }
        };

        let parsed: ResourceSummaries = parse_with_fallback(&raw);
        if !parsed.is_success() {
            warn!(
                "Summary generation returned unusable output: {}",
                parsed.llm_error_message.unwrap_or_default()
            );
            return HashMap::new();
        }

        parsed
            .summaries
            .into_iter()
            .filter_map(|s| {
                let id = Uuid::parse_str(s.resource_id.trim()).ok()?;
                let summary = s.summary.trim().to_string();
                (!summary.is_empty()).then_some((id, summary))
            })
            .collect()
    }

    async fn find_resources(&self, keywords: &[String]) -> Result<Vec<MatchRow>> {
        let patterns: Vec<String> = keywords
            .iter()
            .filter_map(|k| contains_pattern(Some(k)))
            .collect();
        if patterns.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, MatchRow>(&format!(
            r#"
            SELECT {},
                   u.name AS owner_name,
                   u.profile_image AS owner_profile_image,
                   (SELECT COUNT(*) FROM reviews rv WHERE rv.resource_id = r.id) AS reviews_count
            FROM resources r
            JOIN users u ON u.id = r.user_id
            WHERE r.title ILIKE ANY($1) OR r.description ILIKE ANY($1)
            ORDER BY r.view_count DESC, r.created_at DESC
            LIMIT $2
            "#,
            Resource::COLUMNS
        ))
        .bind(&patterns)
        .bind(AI_SEARCH_RESULT_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Latest approved comments, a few per resource
    async fn approved_comments(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<String>>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT resource_id, comment
            FROM (
                SELECT rv.resource_id, rv.comment,
                       ROW_NUMBER() OVER (PARTITION BY rv.resource_id ORDER BY rv.created_at DESC) AS rn
                FROM reviews rv
                WHERE rv.resource_id = ANY($1) AND rv.status = 'approved'
            ) ranked
            WHERE rn <= $2
            "#,
        )
        .bind(ids)
        .bind(AI_SEARCH_REVIEWS_PER_RESOURCE as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut map: HashMap<Uuid, Vec<String>> = HashMap::new();
        for row in rows {
            map.entry(row.resource_id).or_default().push(row.comment);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::ai::testing::ScriptedGenerator;
    use crate::modules::ai::AiError;
    use crate::modules::storage::MemoryStore;
    use crate::shared::test_helpers::lazy_pool;

    fn service(responses: Vec<std::result::Result<String, AiError>>) -> SearchService {
        SearchService::new(
            lazy_pool(),
            Arc::new(MemoryStore::default()),
            Arc::new(ScriptedGenerator::new(responses)),
        )
    }

    #[tokio::test]
    async fn test_keywords_come_from_model_output() {
        let svc = service(vec![Ok(
            r#"{"keywords": ["discrete math", " graphs ", ""]}"#.to_string()
        )]);
        let keywords = svc.extract_keywords("best notes for discrete math").await;
        assert_eq!(keywords, vec!["discrete math", "graphs"]);
    }

    #[tokio::test]
    async fn test_keywords_fall_back_when_model_is_disabled() {
        let svc = service(vec![Err(AiError::Disabled)]);
        let keywords = svc.extract_keywords("operating systems  notes").await;
        assert_eq!(keywords, vec!["operating", "systems", "notes"]);
    }

    #[tokio::test]
    async fn test_keywords_fall_back_on_empty_list() {
        let svc = service(vec![Ok(r#"{"keywords": []}"#.to_string())]);
        let keywords = svc.extract_keywords("compiler design").await;
        assert_eq!(keywords, vec!["compiler", "design"]);
    }

    #[tokio::test]
    async fn test_summaries_keep_only_known_ids() {
        let known = Uuid::now_v7();
        let raw = format!(
            r#"{{"summaries": [
                {{"resource_id": "{}", "summary": "Solid intro to graphs."}},
                {{"resource_id": "not-a-uuid", "summary": "ignored"}}
            ]}}"#,
            known
        );
        let svc = service(vec![Ok(raw)]);
        let items = vec![SummaryPromptItem::new(
            known.to_string(),
            "Graphs".to_string(),
            None,
            &["clear".to_string()],
        )];

        let summaries = svc.summarize(&items).await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[&known], "Solid intro to graphs.");
    }

    #[tokio::test]
    async fn test_summaries_degrade_to_empty_on_model_error() {
        let svc = service(vec![Err(AiError::Request("timeout".to_string()))]);
        let items = vec![SummaryPromptItem::new(
            Uuid::now_v7().to_string(),
            "Trees".to_string(),
            Some("BST basics".to_string()),
            &[],
        )];
        assert!(svc.summarize(&items).await.is_empty());
    }

    #[tokio::test]
    async fn test_summaries_skip_model_when_nothing_matched() {
        let svc = service(vec![]);
        assert!(svc.summarize(&[]).await.is_empty());
    }
}
