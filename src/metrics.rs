use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};

use crate::entities::{Household, Pet, Profile};

/// Seeds the total gauges from the database. Failures leave a gauge at zero.
pub async fn init_metrics(db: &DatabaseConnection) {
    let profiles = Profile::find().count(db).await.unwrap_or(0);
    metrics::gauge!("familypaw_profiles_total").set(profiles as f64);

    let households = Household::find().count(db).await.unwrap_or(0);
    metrics::gauge!("familypaw_households_total").set(households as f64);

    let pets = Pet::find().count(db).await.unwrap_or(0);
    metrics::gauge!("familypaw_pets_total").set(pets as f64);

    tracing::info!(profiles, households, pets, "initialized metrics");
}

pub fn adjust_households(delta: f64) {
    metrics::gauge!("familypaw_households_total").increment(delta);
}

pub fn adjust_pets(delta: f64) {
    metrics::gauge!("familypaw_pets_total").increment(delta);
}

pub fn increment_profiles() {
    metrics::gauge!("familypaw_profiles_total").increment(1.0);
}

pub fn decrement_profiles() {
    metrics::gauge!("familypaw_profiles_total").decrement(1.0);
}

pub fn increment_care_events(action: &'static str) {
    metrics::counter!("familypaw_care_events_total", "action" => action).increment(1);
}

pub fn increment_posts() {
    metrics::counter!("familypaw_posts_total").increment(1);
}

pub fn increment_coupons_issued() {
    metrics::counter!("familypaw_coupons_issued_total").increment(1);
}

pub fn increment_honors_archived() {
    metrics::counter!("familypaw_honors_archived_total").increment(1);
}

pub fn increment_honor_conflicts() {
    metrics::counter!("familypaw_honor_conflicts_total").increment(1);
}

pub fn increment_scoring_failures(category: &'static str) {
    metrics::counter!("familypaw_scoring_query_failures_total", "category" => category).increment(1);
}
