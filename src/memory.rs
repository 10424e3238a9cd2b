use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    attributes::{
        repo::AttrRepository,
        repo_types::{Attr, AttrKind},
    },
    error::StoreError,
    recipes::{
        repo::RecipeRepository,
        repo_types::{Recipe, RecipeDetailRecord, RecipeDraft, RecipeFilter, RecipeRecord},
    },
    users::{repo::UserRepository, repo_types::User},
};

#[derive(Debug, Clone)]
struct StoredRecipe {
    recipe: Recipe,
    ingredient_ids: BTreeSet<i64>,
    tag_ids: BTreeSet<i64>,
}

impl StoredRecipe {
    fn links(&self, kind: AttrKind) -> &BTreeSet<i64> {
        match kind {
            AttrKind::Step => &self.tag_ids,
            AttrKind::Ingredient => &self.ingredient_ids,
        }
    }

    fn record(&self) -> RecipeRecord {
        RecipeRecord {
            recipe: self.recipe.clone(),
            ingredient_ids: self.ingredient_ids.iter().copied().collect(),
            tag_ids: self.tag_ids.iter().copied().collect(),
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    steps: BTreeMap<i64, Attr>,
    ingredients: BTreeMap<i64, Attr>,
    recipes: BTreeMap<i64, StoredRecipe>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn attrs(&self, kind: AttrKind) -> &BTreeMap<i64, Attr> {
        match kind {
            AttrKind::Step => &self.steps,
            AttrKind::Ingredient => &self.ingredients,
        }
    }

    fn attrs_mut(&mut self, kind: AttrKind) -> &mut BTreeMap<i64, Attr> {
        match kind {
            AttrKind::Step => &mut self.steps,
            AttrKind::Ingredient => &mut self.ingredients,
        }
    }

    fn check_owned(&self, kind: AttrKind, owner: Uuid, ids: &[i64]) -> Result<(), StoreError> {
        let table = self.attrs(kind);
        let missing: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| table.get(id).map_or(true, |a| a.user_id != owner))
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::UnknownReferences { kind, ids: missing });
        }
        Ok(())
    }

    fn resolve(&self, kind: AttrKind, ids: &BTreeSet<i64>) -> Vec<Attr> {
        let table = self.attrs(kind);
        ids.iter().filter_map(|id| table.get(id).cloned()).collect()
    }
}

/// Process-local store implementing every repository trait over one set of
/// tables. Each operation holds the lock for its whole duration, so writes
/// are atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn set_active(&self, id: Uuid, active: bool) {
        if let Some(user) = self.tables.write().await.users.get_mut(&id) {
            user.active = active;
        }
    }

    #[cfg(test)]
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    #[cfg(test)]
    pub async fn owned_row_count(&self, owner: Uuid) -> usize {
        let t = self.tables.read().await;
        t.steps.values().filter(|a| a.user_id == owner).count()
            + t.ingredients.values().filter(|a| a.user_id == owner).count()
            + t.recipes.values().filter(|r| r.recipe.user_id == owner).count()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: &User) -> Result<User, StoreError> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("email"));
        }
        t.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        full_name: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let mut t = self.tables.write().await;
        let Some(user) = t.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = full_name {
            user.full_name = name.to_string();
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash.to_string();
        }
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut t = self.tables.write().await;
        if t.users.remove(&id).is_none() {
            return Ok(false);
        }
        t.recipes.retain(|_, r| r.recipe.user_id != id);
        let steps: Vec<i64> = t.steps.values().filter(|a| a.user_id == id).map(|a| a.id).collect();
        let ingredients: Vec<i64> = t
            .ingredients
            .values()
            .filter(|a| a.user_id == id)
            .map(|a| a.id)
            .collect();
        for sid in &steps {
            t.steps.remove(sid);
        }
        for iid in &ingredients {
            t.ingredients.remove(iid);
        }
        for r in t.recipes.values_mut() {
            r.tag_ids.retain(|x| !steps.contains(x));
            r.ingredient_ids.retain(|x| !ingredients.contains(x));
        }
        Ok(true)
    }
}

#[async_trait]
impl AttrRepository for MemoryStore {
    async fn list(
        &self,
        kind: AttrKind,
        owner: Uuid,
        assigned_only: bool,
    ) -> Result<Vec<Attr>, StoreError> {
        let t = self.tables.read().await;
        let mut rows: Vec<Attr> = t
            .attrs(kind)
            .values()
            .filter(|a| a.user_id == owner)
            .filter(|a| !assigned_only || t.recipes.values().any(|r| r.links(kind).contains(&a.id)))
            .cloned()
            .collect();
        rows.sort_by_cached_key(|a| Reverse((a.name.to_lowercase(), a.name.clone(), a.id)));
        Ok(rows)
    }

    async fn create(&self, kind: AttrKind, owner: Uuid, name: &str) -> Result<Attr, StoreError> {
        let mut t = self.tables.write().await;
        let attr = Attr {
            id: t.next_id(),
            user_id: owner,
            name: name.to_string(),
        };
        t.attrs_mut(kind).insert(attr.id, attr.clone());
        Ok(attr)
    }
}

fn matches_any(links: &BTreeSet<i64>, wanted: Option<&Vec<i64>>) -> bool {
    wanted.map_or(true, |ids| ids.iter().any(|id| links.contains(id)))
}

#[async_trait]
impl RecipeRepository for MemoryStore {
    async fn list(&self, owner: Uuid, filter: &RecipeFilter) -> Result<Vec<RecipeRecord>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.recipes
            .values()
            .filter(|r| r.recipe.user_id == owner)
            .filter(|r| matches_any(&r.tag_ids, filter.step_ids.as_ref()))
            .filter(|r| matches_any(&r.ingredient_ids, filter.ingredient_ids.as_ref()))
            .map(StoredRecipe::record)
            .collect())
    }

    async fn get(&self, owner: Uuid, id: i64) -> Result<Option<RecipeDetailRecord>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.recipes
            .get(&id)
            .filter(|r| r.recipe.user_id == owner)
            .map(|r| RecipeDetailRecord {
                recipe: r.recipe.clone(),
                ingredients: t.resolve(AttrKind::Ingredient, &r.ingredient_ids),
                tags: t.resolve(AttrKind::Step, &r.tag_ids),
            }))
    }

    async fn create(&self, owner: Uuid, draft: &RecipeDraft) -> Result<RecipeRecord, StoreError> {
        let mut t = self.tables.write().await;
        t.check_owned(AttrKind::Ingredient, owner, &draft.ingredient_ids)?;
        t.check_owned(AttrKind::Step, owner, &draft.tag_ids)?;
        let stored = StoredRecipe {
            recipe: Recipe {
                id: t.next_id(),
                user_id: owner,
                title: draft.title.clone(),
                time_minutes: draft.time_minutes,
                price: draft.price,
                link: draft.link.clone(),
            },
            ingredient_ids: draft.ingredient_ids.iter().copied().collect(),
            tag_ids: draft.tag_ids.iter().copied().collect(),
        };
        let record = stored.record();
        t.recipes.insert(stored.recipe.id, stored);
        Ok(record)
    }

    async fn update(
        &self,
        owner: Uuid,
        id: i64,
        draft: &RecipeDraft,
    ) -> Result<Option<RecipeRecord>, StoreError> {
        let mut t = self.tables.write().await;
        if !t.recipes.get(&id).is_some_and(|r| r.recipe.user_id == owner) {
            return Ok(None);
        }
        t.check_owned(AttrKind::Ingredient, owner, &draft.ingredient_ids)?;
        t.check_owned(AttrKind::Step, owner, &draft.tag_ids)?;
        let Some(stored) = t.recipes.get_mut(&id) else {
            return Ok(None);
        };
        stored.recipe.title = draft.title.clone();
        stored.recipe.time_minutes = draft.time_minutes;
        stored.recipe.price = draft.price;
        stored.recipe.link = draft.link.clone();
        stored.ingredient_ids = draft.ingredient_ids.iter().copied().collect();
        stored.tag_ids = draft.tag_ids.iter().copied().collect();
        Ok(Some(stored.record()))
    }

    async fn delete(&self, owner: Uuid, id: i64) -> Result<bool, StoreError> {
        let mut t = self.tables.write().await;
        if !t.recipes.get(&id).is_some_and(|r| r.recipe.user_id == owner) {
            return Ok(false);
        }
        t.recipes.remove(&id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use time::OffsetDateTime;

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.into(),
            full_name: "Cook".into(),
            password_hash: "$argon2id$x".into(),
            active: true,
            staff: false,
            admin: false,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn draft(title: &str, ingredient_ids: Vec<i64>, tag_ids: Vec<i64>) -> RecipeDraft {
        RecipeDraft {
            title: title.into(),
            time_minutes: 10,
            price: Decimal::new(550, 2),
            link: String::new(),
            ingredient_ids,
            tag_ids,
        }
    }

    #[tokio::test]
    async fn attrs_are_scoped_and_sorted_by_name_desc() {
        let store = MemoryStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        AttrRepository::create(&store, AttrKind::Step, a, "Boil").await.unwrap();
        AttrRepository::create(&store, AttrKind::Step, a, "Chop").await.unwrap();
        AttrRepository::create(&store, AttrKind::Step, b, "Fry").await.unwrap();
        AttrRepository::create(&store, AttrKind::Ingredient, a, "Salt").await.unwrap();

        let names: Vec<String> = AttrRepository::list(&store, AttrKind::Step, a, false)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Chop", "Boil"]);
    }

    #[tokio::test]
    async fn assigned_only_requires_a_recipe_link() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let salt = AttrRepository::create(&store, AttrKind::Ingredient, owner, "Salt").await.unwrap();
        AttrRepository::create(&store, AttrKind::Ingredient, owner, "Pepper").await.unwrap();
        RecipeRepository::create(&store, owner, &draft("Soup", vec![salt.id], vec![]))
            .await
            .unwrap();
        RecipeRepository::create(&store, owner, &draft("Broth", vec![salt.id], vec![]))
            .await
            .unwrap();

        let assigned = AttrRepository::list(&store, AttrKind::Ingredient, owner, true).await.unwrap();
        assert_eq!(assigned, vec![salt]);
        let all = AttrRepository::list(&store, AttrKind::Ingredient, owner, false).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn recipe_links_must_be_owned() {
        let store = MemoryStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let foreign = AttrRepository::create(&store, AttrKind::Step, b, "Bake").await.unwrap();
        let err = RecipeRepository::create(&store, a, &draft("Pie", vec![], vec![foreign.id]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownReferences { kind: AttrKind::Step, .. }));
        assert!(RecipeRepository::list(&store, a, &RecipeFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn recipe_filters_apply() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let s1 = AttrRepository::create(&store, AttrKind::Step, owner, "Boil").await.unwrap();
        let s2 = AttrRepository::create(&store, AttrKind::Step, owner, "Bake").await.unwrap();
        let i1 = AttrRepository::create(&store, AttrKind::Ingredient, owner, "Egg").await.unwrap();
        let soup = RecipeRepository::create(&store, owner, &draft("Soup", vec![], vec![s1.id]))
            .await
            .unwrap();
        let cake = RecipeRepository::create(&store, owner, &draft("Cake", vec![i1.id], vec![s2.id]))
            .await
            .unwrap();
        RecipeRepository::create(&store, owner, &draft("Salad", vec![], vec![]))
            .await
            .unwrap();

        let by_steps = RecipeFilter {
            step_ids: Some(vec![s1.id, s2.id]),
            ingredient_ids: None,
        };
        let ids: Vec<i64> = RecipeRepository::list(&store, owner, &by_steps)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.recipe.id)
            .collect();
        assert_eq!(ids, vec![soup.recipe.id, cake.recipe.id]);

        let both = RecipeFilter {
            step_ids: Some(vec![s1.id, s2.id]),
            ingredient_ids: Some(vec![i1.id]),
        };
        let rows = RecipeRepository::list(&store, owner, &both).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].recipe.id, cake.recipe.id);
    }

    #[tokio::test]
    async fn deleting_user_cascades() {
        let store = MemoryStore::new();
        let u = UserRepository::insert(&store, &user("a@example.com")).await.unwrap();
        let other = UserRepository::insert(&store, &user("b@example.com")).await.unwrap();
        let step = AttrRepository::create(&store, AttrKind::Step, u.id, "Boil").await.unwrap();
        AttrRepository::create(&store, AttrKind::Ingredient, u.id, "Salt").await.unwrap();
        RecipeRepository::create(&store, u.id, &draft("Soup", vec![], vec![step.id]))
            .await
            .unwrap();
        AttrRepository::create(&store, AttrKind::Step, other.id, "Fry").await.unwrap();
        assert_eq!(store.owned_row_count(u.id).await, 3);

        assert!(UserRepository::delete(&store, u.id).await.unwrap());
        assert_eq!(store.owned_row_count(u.id).await, 0);
        assert_eq!(store.owned_row_count(other.id).await, 1);
        assert!(!UserRepository::delete(&store, u.id).await.unwrap());
    }
}
