use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, Set};

use super::now;
use crate::entities::address;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressFields {
    pub postal_code: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub block: Option<String>,
    pub lot: Option<String>,
}

impl AddressFields {
    fn apply(self, am: &mut address::ActiveModel) {
        am.postal_code = Set(self.postal_code);
        am.street = Set(self.street);
        am.number = Set(self.number);
        am.district = Set(self.district);
        am.city = Set(self.city);
        am.state = Set(self.state);
        am.block = Set(self.block);
        am.lot = Set(self.lot);
    }
}

pub async fn find<C: ConnectionTrait>(db: &C, id_address: i32) -> Result<Option<address::Model>, DbErr> {
    address::Entity::find_by_id(id_address).one(db).await
}

pub async fn create<C: ConnectionTrait>(db: &C, fields: AddressFields) -> Result<address::Model, DbErr> {
    let mut am = <address::ActiveModel as Default>::default();
    fields.apply(&mut am);
    am.insert(db).await
}

/// Fails with `RecordNotFound` when the row does not exist.
pub async fn update<C: ConnectionTrait>(
    db: &C,
    id_address: i32,
    fields: AddressFields,
) -> Result<address::Model, DbErr> {
    let found = find(db, id_address)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("address {id_address}")))?;
    let mut am: address::ActiveModel = found.into();
    fields.apply(&mut am);
    am.updated_at = Set(now());
    am.update(db).await
}

pub async fn delete<C: ConnectionTrait>(db: &C, id_address: i32) -> Result<(), DbErr> {
    let res = address::Entity::delete_by_id(id_address).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(DbErr::RecordNotFound(format!("address {id_address}")));
    }
    Ok(())
}
