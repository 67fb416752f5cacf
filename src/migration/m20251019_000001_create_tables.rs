use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Addresses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Addresses::IdAddress).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Addresses::PostalCode).string_len(16))
                    .col(ColumnDef::new(Addresses::Street).string())
                    .col(ColumnDef::new(Addresses::Number).string_len(16))
                    .col(ColumnDef::new(Addresses::District).string())
                    .col(ColumnDef::new(Addresses::City).string())
                    .col(ColumnDef::new(Addresses::State).string_len(32))
                    .col(ColumnDef::new(Addresses::Block).string_len(16))
                    .col(ColumnDef::new(Addresses::Lot).string_len(16))
                    .col(timestamp(Addresses::CreatedAt))
                    .col(timestamp(Addresses::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::IdUser).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::BirthDate).date())
                    .col(ColumnDef::new(Users::Phone).string_len(32))
                    .col(ColumnDef::new(Users::AgreedWithTerms).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Users::IsEmailConfirmed).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::Role).string_len(16).not_null().default("USER"))
                    .col(ColumnDef::new(Users::PhotoPath).string())
                    .col(ColumnDef::new(Users::IdAddress).integer())
                    .col(timestamp(Users::CreatedAt))
                    .col(timestamp(Users::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_address")
                            .from(Users::Table, Users::IdAddress)
                            .to(Addresses::Table, Addresses::IdAddress)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Roles::IdRole).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Roles::Name).string_len(64).not_null().unique_key())
                    .col(ColumnDef::new(Roles::Description).string())
                    .col(timestamp(Roles::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Posts::IdPost).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Posts::PostType).small_integer().not_null())
                    .col(ColumnDef::new(Posts::ProfileFallback).string_len(8).not_null())
                    .col(ColumnDef::new(Posts::ProfileUrl).string())
                    .col(ColumnDef::new(Posts::Name).string().not_null())
                    .col(ColumnDef::new(Posts::Description).text())
                    .col(
                        ColumnDef::new(Posts::MediaList)
                            .array(ColumnType::Text)
                            .not_null()
                            .default(Expr::cust("'{}'")),
                    )
                    .col(ColumnDef::new(Posts::IsSaved).boolean().not_null().default(false))
                    .col(ColumnDef::new(Posts::CommentsQty).integer().not_null().default(0))
                    .col(ColumnDef::new(Posts::LikesQty).integer().not_null().default(0))
                    .col(ColumnDef::new(Posts::SenderId).integer().not_null())
                    .col(timestamp(Posts::CreatedAt))
                    .col(timestamp(Posts::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_sender")
                            .from(Posts::Table, Posts::SenderId)
                            .to(Users::Table, Users::IdUser)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_posts_sender")
                    .table(Posts::Table)
                    .col(Posts::SenderId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Comments::IdComment).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Comments::IdPost).integer().not_null())
                    .col(ColumnDef::new(Comments::SenderId).integer().not_null())
                    .col(ColumnDef::new(Comments::Description).text().not_null())
                    .col(timestamp(Comments::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_post")
                            .from(Comments::Table, Comments::IdPost)
                            .to(Posts::Table, Posts::IdPost)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_sender")
                            .from(Comments::Table, Comments::SenderId)
                            .to(Users::Table, Users::IdUser)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Likes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Likes::IdLike).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Likes::IdPost).integer().not_null())
                    .col(ColumnDef::new(Likes::SenderId).integer().not_null())
                    .col(timestamp(Likes::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_likes_post")
                            .from(Likes::Table, Likes::IdPost)
                            .to(Posts::Table, Posts::IdPost)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_likes_sender")
                            .from(Likes::Table, Likes::SenderId)
                            .to(Users::Table, Users::IdUser)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_likes_post_sender")
                    .table(Likes::Table)
                    .col(Likes::IdPost)
                    .col(Likes::SenderId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Messages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Messages::IdMessage).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Messages::Content).text().not_null())
                    .col(ColumnDef::new(Messages::SenderId).integer().not_null())
                    .col(ColumnDef::new(Messages::IsRead).boolean().not_null().default(false))
                    .col(timestamp(Messages::CreatedAt))
                    .col(timestamp(Messages::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_messages_sender")
                            .from(Messages::Table, Messages::SenderId)
                            .to(Users::Table, Users::IdUser)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Messages::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Likes::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Comments::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Posts::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Roles::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Addresses::Table).to_owned()).await
    }
}

fn timestamp<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(DeriveIden)]
enum Addresses {
    Table,
    IdAddress,
    PostalCode,
    Street,
    Number,
    District,
    City,
    State,
    Block,
    Lot,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    IdUser,
    Name,
    Email,
    Password,
    BirthDate,
    Phone,
    AgreedWithTerms,
    IsActive,
    IsEmailConfirmed,
    Role,
    PhotoPath,
    IdAddress,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Roles {
    Table,
    IdRole,
    Name,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    IdPost,
    PostType,
    ProfileFallback,
    ProfileUrl,
    Name,
    Description,
    MediaList,
    IsSaved,
    CommentsQty,
    LikesQty,
    SenderId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    IdComment,
    IdPost,
    SenderId,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Likes {
    Table,
    IdLike,
    IdPost,
    SenderId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Messages {
    Table,
    IdMessage,
    Content,
    SenderId,
    IsRead,
    CreatedAt,
    UpdatedAt,
}
