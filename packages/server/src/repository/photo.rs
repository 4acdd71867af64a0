use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use super::page_offset;
use crate::entity::photo;

pub struct PhotoRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> PhotoRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn create(&self, record: photo::ActiveModel) -> Result<photo::Model, DbErr> {
        record.insert(self.conn).await
    }

    /// One page of a collection's non-deleted photos, newest first, plus the total.
    pub async fn list_for_collection(
        &self,
        collection_code: &str,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<photo::Model>, u64), DbErr> {
        let base = photo::Entity::find()
            .filter(photo::Column::CollectionCode.eq(collection_code))
            .filter(photo::Column::IsDeleted.eq(false));

        let total = base.clone().count(self.conn).await?;
        let photos = base
            .order_by_desc(photo::Column::UploadedAt)
            .order_by_desc(photo::Column::Id)
            .offset(page_offset(page, per_page))
            .limit(per_page)
            .all(self.conn)
            .await?;

        Ok((photos, total))
    }
}
