use std::sync::Arc;

use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::error::{on_unique_violation, AppError, Result};
use crate::features::categories::dtos::{
    CategoryDetailDto, CategoryFlatDto, CategoryParentDto, CategoryResourceDto,
    CategoryResourceOwnerDto, CategoryResponseDto, CategoryTreeDto, CreateCategoryDto,
    UpdateCategoryDto,
};
use crate::features::categories::models::Category;
use crate::features::categories::tree::{CategoryForest, CategoryTreeError};
use crate::modules::storage::{delete_quietly, discard_on_error, AssetKind, ObjectStore};
use crate::shared::constants::CATEGORY_SAMPLE_RESOURCES;
use crate::shared::types::{contains_pattern, PageWindow};
use crate::shared::upload::UploadedFile;

/// Where a category image stands after an update
#[derive(Debug, PartialEq, Eq)]
struct ImageChange {
    /// Key the row references afterwards
    stored: Option<String>,
    /// Key to remove once the write commits
    released: Option<String>,
}

/// Clearing wins over a new upload; the service does not upload when clearing.
fn plan_image(new_image: Option<String>, clear: bool, old_image: Option<String>) -> ImageChange {
    match (new_image, clear) {
        (_, true) => ImageChange {
            stored: None,
            released: old_image,
        },
        (Some(new), false) => ImageChange {
            released: old_image.filter(|old| *old != new),
            stored: Some(new),
        },
        (None, false) => ImageChange {
            stored: old_image,
            released: None,
        },
    }
}

#[derive(sqlx::FromRow)]
struct SampleResourceRow {
    id: Uuid,
    title: String,
    user_id: Uuid,
    user_name: String,
}

/// Service for category operations
pub struct CategoryService {
    pool: PgPool,
    storage: Arc<dyn ObjectStore>,
}

impl CategoryService {
    pub fn new(pool: PgPool, storage: Arc<dyn ObjectStore>) -> Self {
        Self { pool, storage }
    }

    /// Open a transaction holding the category write lock.
    ///
    /// SHARE ROW EXCLUSIVE conflicts with itself, so structural writes are
    /// serialized while plain reads continue.
    async fn begin_locked(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("LOCK TABLE categories IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    async fn load_forest(conn: &mut PgConnection) -> Result<CategoryForest> {
        let rows = sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories",
            Category::COLUMNS
        ))
        .fetch_all(conn)
        .await?;

        Ok(CategoryForest::from_rows(rows))
    }

    /// `roots` plus every descendant, as one snapshot
    async fn load_subtrees(&self, roots: &[Uuid]) -> Result<CategoryForest> {
        if roots.is_empty() {
            return Ok(CategoryForest::default());
        }

        // UNION (not UNION ALL) terminates even if the stored parents loop
        let rows = sqlx::query_as::<_, Category>(
            r#"
            WITH RECURSIVE subtree AS (
                SELECT id, name, parent_id, image_path, created_at, updated_at
                FROM categories
                WHERE id = ANY($1)
                UNION
                SELECT c.id, c.name, c.parent_id, c.image_path, c.created_at, c.updated_at
                FROM categories c
                JOIN subtree s ON c.parent_id = s.id
            )
            SELECT id, name, parent_id, image_path, created_at, updated_at FROM subtree
            "#,
        )
        .bind(roots)
        .fetch_all(&self.pool)
        .await?;

        Ok(CategoryForest::from_rows(rows))
    }

    fn tree_dto(&self, forest: &CategoryForest, roots: &[Uuid]) -> Vec<CategoryTreeDto> {
        let storage = self.storage.as_ref();
        forest.build_forest(roots, |category, children| {
            CategoryTreeDto::from_node(category, children, storage)
        })
    }

    async fn store_image(&self, image: Option<UploadedFile>) -> Result<Option<String>> {
        let Some(file) = image else {
            return Ok(None);
        };
        let key = self
            .storage
            .put(
                AssetKind::CategoryImage,
                file.extension().as_deref(),
                file.bytes,
                &file.content_type,
            )
            .await?;
        Ok(Some(key))
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Root categories with their full subtrees, paginated over roots
    pub async fn list_tree(
        &self,
        search: Option<&str>,
        window: PageWindow,
    ) -> Result<(Vec<CategoryTreeDto>, i64)> {
        let pattern = contains_pattern(search);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM categories
            WHERE parent_id IS NULL AND ($1::text IS NULL OR name ILIKE $1)
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let root_ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM categories
            WHERE parent_id IS NULL AND ($1::text IS NULL OR name ILIKE $1)
            ORDER BY LOWER(name), name
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        let forest = self.load_subtrees(&root_ids).await?;
        debug!(
            roots = root_ids.len(),
            nodes = forest.len(),
            "Loaded category subtrees"
        );

        Ok((self.tree_dto(&forest, &root_ids), total))
    }

    /// Every category ordered by name
    pub async fn list_flat(&self, search: Option<&str>) -> Result<Vec<CategoryFlatDto>> {
        let mut conn = self.pool.acquire().await?;
        let forest = Self::load_forest(&mut conn).await?;

        Ok(forest
            .flat(search)
            .into_iter()
            .map(CategoryFlatDto::from)
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<CategoryDetailDto> {
        let forest = self.load_subtrees(&[id]).await?;
        let category = forest
            .get(id)
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

        let parent = match category.parent_id {
            Some(parent_id) => {
                sqlx::query_as::<_, CategoryParentDto>(
                    "SELECT id, name FROM categories WHERE id = $1",
                )
                .bind(parent_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => None,
        };

        let resources = sqlx::query_as::<_, SampleResourceRow>(
            r#"
            SELECT r.id, r.title, u.id AS user_id, u.name AS user_name
            FROM resources r
            JOIN resource_categories rc ON rc.resource_id = r.id
            JOIN users u ON u.id = r.user_id
            WHERE rc.category_id = $1
            ORDER BY r.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(id)
        .bind(CATEGORY_SAMPLE_RESOURCES)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| CategoryResourceDto {
            id: row.id,
            title: row.title,
            user: CategoryResourceOwnerDto {
                id: row.user_id,
                name: row.user_name,
            },
        })
        .collect();

        let base = CategoryResponseDto::from_model(category, self.storage.as_ref());
        Ok(CategoryDetailDto {
            id: base.id,
            name: base.name,
            parent_id: base.parent_id,
            image_url: base.image_url,
            created_at: base.created_at,
            updated_at: base.updated_at,
            parent,
            children: self.tree_dto(&forest, forest.children_of(id)),
            resources,
        })
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    pub async fn create(
        &self,
        dto: CreateCategoryDto,
        image: Option<UploadedFile>,
    ) -> Result<CategoryTreeDto> {
        let image_path = self.store_image(image).await?;

        let result = self.insert_locked(&dto, image_path.clone()).await;
        let category =
            discard_on_error(self.storage.as_ref(), image_path.as_deref(), result).await?;

        info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(CategoryTreeDto::from_node(
            &category,
            Vec::new(),
            self.storage.as_ref(),
        ))
    }

    async fn insert_locked(
        &self,
        dto: &CreateCategoryDto,
        image_path: Option<String>,
    ) -> Result<Category> {
        let mut tx = self.begin_locked().await?;
        let mut forest = Self::load_forest(&mut tx).await?;

        let planned = forest.create(&dto.name, dto.parent_id, image_path)?.clone();

        let category = sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (id, name, parent_id, image_path)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            Category::COLUMNS
        ))
        .bind(planned.id)
        .bind(&planned.name)
        .bind(planned.parent_id)
        .bind(&planned.image_path)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            on_unique_violation(e, || {
                CategoryTreeError::DuplicateName(planned.name.clone()).into()
            })
        })?;

        tx.commit().await?;
        Ok(category)
    }

    /// Rename, reparent and replace or clear the image in one transaction.
    /// Returns the category with its subtree.
    pub async fn update(
        &self,
        id: Uuid,
        dto: UpdateCategoryDto,
        image: Option<UploadedFile>,
    ) -> Result<CategoryTreeDto> {
        let new_image = if dto.clear_image {
            None
        } else {
            self.store_image(image).await?
        };

        let result = self.update_locked(id, &dto, new_image.clone()).await;
        let (forest, released) =
            discard_on_error(self.storage.as_ref(), new_image.as_deref(), result).await?;

        delete_quietly(self.storage.as_ref(), released.as_deref()).await;

        info!(category_id = %id, "Category updated");
        let storage = self.storage.as_ref();
        forest
            .build_subtree(id, &mut |category: &Category, children: Vec<CategoryTreeDto>| {
                CategoryTreeDto::from_node(category, children, storage)
            })
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    /// Returns the forest as committed and the image key it no longer references
    async fn update_locked(
        &self,
        id: Uuid,
        dto: &UpdateCategoryDto,
        new_image: Option<String>,
    ) -> Result<(CategoryForest, Option<String>)> {
        let mut tx = self.begin_locked().await?;
        let mut forest = Self::load_forest(&mut tx).await?;

        let old_image = forest
            .get(id)
            .ok_or(CategoryTreeError::UnknownCategory(id))?
            .image_path
            .clone();

        if let Some(name) = &dto.name {
            forest.rename(id, name)?;
        }
        if let Some(parent_id) = dto.parent_id {
            forest.reparent(id, parent_id)?;
        }

        let change = plan_image(new_image, dto.clear_image, old_image);

        let planned = forest
            .get(id)
            .ok_or(CategoryTreeError::UnknownCategory(id))?;

        let category = sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories
            SET name = $2, parent_id = $3, image_path = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            Category::COLUMNS
        ))
        .bind(id)
        .bind(&planned.name)
        .bind(planned.parent_id)
        .bind(&change.stored)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            on_unique_violation(e, || {
                CategoryTreeError::DuplicateName(planned.name.clone()).into()
            })
        })?;

        tx.commit().await?;

        forest.replace(category);
        Ok((forest, change.released))
    }

    /// Delete a category; its children move up to its parent
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.begin_locked().await?;
        let mut forest = Self::load_forest(&mut tx).await?;

        let removal = forest.remove(id)?;

        sqlx::query(
            "UPDATE categories SET parent_id = $1, updated_at = NOW() WHERE parent_id = $2",
        )
        .bind(removal.removed.parent_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        delete_quietly(self.storage.as_ref(), removal.removed.image_path.as_deref()).await;

        info!(
            category_id = %id,
            reparented = removal.reparented.len(),
            "Category deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::MemoryStore;

    fn key(name: &str) -> Option<String> {
        Some(format!("public/categories/{}.png", name))
    }

    #[test]
    fn test_new_image_replaces_old() {
        assert_eq!(
            plan_image(key("new"), false, key("old")),
            ImageChange {
                stored: key("new"),
                released: key("old"),
            }
        );
        assert_eq!(
            plan_image(key("new"), false, None),
            ImageChange {
                stored: key("new"),
                released: None,
            }
        );
    }

    #[test]
    fn test_clear_wins_over_new_image() {
        assert_eq!(
            plan_image(key("new"), true, key("old")),
            ImageChange {
                stored: None,
                released: key("old"),
            }
        );
        assert_eq!(
            plan_image(None, true, key("old")),
            ImageChange {
                stored: None,
                released: key("old"),
            }
        );
        assert_eq!(
            plan_image(None, true, None),
            ImageChange {
                stored: None,
                released: None,
            }
        );
    }

    #[test]
    fn test_untouched_image_is_kept() {
        assert_eq!(
            plan_image(None, false, key("old")),
            ImageChange {
                stored: key("old"),
                released: None,
            }
        );
        // Re-sending the stored key must not delete it
        assert_eq!(
            plan_image(key("old"), false, key("old")),
            ImageChange {
                stored: key("old"),
                released: None,
            }
        );
    }

    async fn uploaded(store: &MemoryStore) -> String {
        store
            .put(AssetKind::CategoryImage, Some("png"), b"img".to_vec(), "image/png")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_failed_write_discards_new_upload() {
        let store = MemoryStore::default();
        let new_key = uploaded(&store).await;

        let failed: Result<()> = Err(CategoryTreeError::DuplicateName("Math".to_string()).into());
        let result = discard_on_error(&store, Some(&new_key), failed).await;

        assert!(result.is_err());
        assert!(!store.exists(&new_key).await.unwrap());
    }

    #[tokio::test]
    async fn test_successful_write_keeps_new_upload() {
        let store = MemoryStore::default();
        let new_key = uploaded(&store).await;

        let result = discard_on_error(&store, Some(&new_key), Ok(7)).await;

        assert_eq!(result.unwrap(), 7);
        assert!(store.exists(&new_key).await.unwrap());
    }

    #[tokio::test]
    async fn test_removed_category_releases_its_image() {
        let store = MemoryStore::default();
        let image = uploaded(&store).await;
        let mut forest = CategoryForest::default();
        let science = forest
            .create("Science", None, Some(image.clone()))
            .unwrap()
            .id;

        let removal = forest.remove(science).unwrap();
        delete_quietly(&store, removal.removed.image_path.as_deref()).await;

        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_updated_subtree_reflects_committed_row() {
        let storage = MemoryStore::default();
        let mut forest = CategoryForest::default();
        let science = forest.create("Science", None, None).unwrap().id;
        forest.create("Math", Some(science), None).unwrap();

        let mut row = forest.get(science).unwrap().clone();
        row.image_path = key("science");
        forest.replace(row);

        let tree = forest
            .build_subtree(science, &mut |category: &Category, children: Vec<CategoryTreeDto>| {
                CategoryTreeDto::from_node(category, children, &storage)
            })
            .unwrap();
        assert_eq!(
            tree.image_url.as_deref(),
            Some("http://storage.test/bucket/public/categories/science.png")
        );
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].name, "Math");
    }
}
