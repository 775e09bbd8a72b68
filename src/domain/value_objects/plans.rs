use serde::Serialize;

/// Slug of the free trial tier, ordered first in the catalog.
pub const TRIAL_PLAN_SLUG: &str = "trial";

/// Feature flags attached to a plan tier.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PlanFeatures {
    pub can_manage_schedule: bool,
    pub can_receive_bookings: bool,
    pub search_priority: i32,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Plan {
    pub slug: &'static str,
    pub name: &'static str,
    /// Monthly price in centavos. Zero marks a free tier.
    pub price_minor: i32,
    /// Maximum concurrent service offerings. `None` means unlimited.
    pub max_services: Option<usize>,
    pub features: PlanFeatures,
    pub trial_days: Option<i64>,
}

impl Plan {
    pub fn is_free(&self) -> bool {
        self.price_minor == 0
    }
}

/// Client-facing projection of a catalog entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanDto {
    pub slug: String,
    pub name: String,
    pub price_minor: i32,
    pub max_services: Option<usize>,
    pub can_manage_schedule: bool,
    pub can_receive_bookings: bool,
    pub search_priority: i32,
    pub trial_days: Option<i64>,
    pub is_free: bool,
}

impl From<&Plan> for PlanDto {
    fn from(plan: &Plan) -> Self {
        Self {
            slug: plan.slug.to_string(),
            name: plan.name.to_string(),
            price_minor: plan.price_minor,
            max_services: plan.max_services,
            can_manage_schedule: plan.features.can_manage_schedule,
            can_receive_bookings: plan.features.can_receive_bookings,
            search_priority: plan.features.search_priority,
            trial_days: plan.trial_days,
            is_free: plan.is_free(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanChangeDirection {
    Upgrade,
    Downgrade,
    Lateral,
}

/// Canonical, totally ordered plan table. Ordering is by ascending monthly
/// price, so the free trial always comes first. Pure lookups, no side effects.
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    pub fn new(mut plans: Vec<Plan>) -> Self {
        plans.sort_by_key(|plan| plan.price_minor);
        Self { plans }
    }

    /// The production plan table: trial (free), basic, premium.
    pub fn standard() -> Self {
        Self::new(vec![
            Plan {
                slug: TRIAL_PLAN_SLUG,
                name: "Trial",
                price_minor: 0,
                max_services: Some(3),
                features: PlanFeatures {
                    can_manage_schedule: true,
                    can_receive_bookings: true,
                    search_priority: 0,
                },
                trial_days: Some(30),
            },
            Plan {
                slug: "basic",
                name: "Basic",
                price_minor: 2990,
                max_services: Some(5),
                features: PlanFeatures {
                    can_manage_schedule: true,
                    can_receive_bookings: true,
                    search_priority: 0,
                },
                trial_days: None,
            },
            Plan {
                slug: "premium",
                name: "Premium",
                price_minor: 4990,
                max_services: None,
                features: PlanFeatures {
                    can_manage_schedule: true,
                    can_receive_bookings: true,
                    search_priority: 1,
                },
                trial_days: None,
            },
        ])
    }

    pub fn all(&self) -> &[Plan] {
        &self.plans
    }

    pub fn get(&self, slug: &str) -> Option<&Plan> {
        self.plans.iter().find(|plan| plan.slug == slug)
    }

    /// Strict price comparison. Equal prices are neither an upgrade nor a
    /// downgrade, only a lateral select.
    pub fn direction(&self, from: &Plan, to: &Plan) -> PlanChangeDirection {
        if to.price_minor > from.price_minor {
            PlanChangeDirection::Upgrade
        } else if to.price_minor < from.price_minor {
            PlanChangeDirection::Downgrade
        } else {
            PlanChangeDirection::Lateral
        }
    }

    pub fn is_upgrade(&self, from: &Plan, to: &Plan) -> bool {
        self.direction(from, to) == PlanChangeDirection::Upgrade
    }

    pub fn is_downgrade(&self, from: &Plan, to: &Plan) -> bool {
        self.direction(from, to) == PlanChangeDirection::Downgrade
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_is_ordered_by_ascending_price() {
        let catalog = PlanCatalog::standard();
        let prices: Vec<i32> = catalog.all().iter().map(|plan| plan.price_minor).collect();

        let mut sorted = prices.clone();
        sorted.sort();
        assert_eq!(prices, sorted);
        assert_eq!(catalog.all()[0].slug, TRIAL_PLAN_SLUG);
    }

    #[test]
    fn unknown_slug_is_not_found() {
        let catalog = PlanCatalog::standard();
        assert!(catalog.get("platinum").is_none());
        assert!(catalog.get("basic").is_some());
    }

    #[test]
    fn upgrade_and_downgrade_are_symmetric_when_prices_differ() {
        let catalog = PlanCatalog::standard();
        for from in catalog.all() {
            for to in catalog.all() {
                if from.price_minor != to.price_minor {
                    assert_eq!(catalog.is_upgrade(from, to), catalog.is_downgrade(to, from));
                }
            }
        }
    }

    #[test]
    fn equal_price_is_lateral_in_both_directions() {
        let catalog = PlanCatalog::standard();
        let basic = catalog.get("basic").unwrap();
        let same_price = Plan {
            slug: "basic-legacy",
            ..*basic
        };

        assert_eq!(
            catalog.direction(basic, &same_price),
            PlanChangeDirection::Lateral
        );
        assert!(!catalog.is_upgrade(basic, &same_price));
        assert!(!catalog.is_downgrade(&same_price, basic));
    }

    #[test]
    fn trial_to_premium_is_an_upgrade() {
        let catalog = PlanCatalog::standard();
        let trial = catalog.get(TRIAL_PLAN_SLUG).unwrap();
        let premium = catalog.get("premium").unwrap();

        assert!(catalog.is_upgrade(trial, premium));
        assert!(catalog.is_downgrade(premium, trial));
    }

    #[test]
    fn quota_lookup_reflects_the_seeded_limits() {
        let catalog = PlanCatalog::standard();
        assert_eq!(catalog.get(TRIAL_PLAN_SLUG).unwrap().max_services, Some(3));
        assert_eq!(catalog.get("basic").unwrap().max_services, Some(5));
        assert_eq!(catalog.get("premium").unwrap().max_services, None);
    }
}
