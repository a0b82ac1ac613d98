use sea_orm_migration::prelude::*;

mod m20260301_000001_create_households;
mod m20260301_000002_create_pets;
mod m20260305_000001_create_social;
mod m20260305_000002_create_lists;
mod m20260310_000001_create_weekly_honors;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_households::Migration),
            Box::new(m20260301_000002_create_pets::Migration),
            Box::new(m20260305_000001_create_social::Migration),
            Box::new(m20260305_000002_create_lists::Migration),
            Box::new(m20260310_000001_create_weekly_honors::Migration),
        ]
    }
}
