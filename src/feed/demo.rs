//! Built-in sample topology with randomly rolled health, for running the
//! dashboard without a backend.

use super::{Feed, FeedUpdate};
use crate::graph::types::{Entity, RawHealth, RawHealthMap};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct DemoFeed {
    entities: Vec<Entity>,
    rng: StdRng,
    delivered_entities: bool,
}

impl DemoFeed {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    #[cfg(test)]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            entities: sample_entities(),
            rng,
            delivered_entities: false,
        }
    }

    fn roll_health(&mut self) -> RawHealthMap {
        let mut health = RawHealthMap::new();
        for entity in &self.entities {
            // Batch jobs are switched off in the sample setup
            if entity.key == "batch" {
                health.insert(
                    entity.key.clone(),
                    RawHealth { ok: false, disabled: Some(true), ..Default::default() },
                );
                continue;
            }
            let roll: f32 = self.rng.gen();
            let ms = self.rng.gen_range(8.0..320.0_f64).round();
            let raw = if roll < 0.80 {
                RawHealth { ok: true, ms: Some(ms), ..Default::default() }
            } else if roll < 0.92 {
                RawHealth { ok: true, degraded: Some(true), ms: Some(ms * 4.0), ..Default::default() }
            } else {
                RawHealth { ok: false, ..Default::default() }
            };
            health.insert(entity.key.clone(), raw);
        }
        health
    }
}

impl Default for DemoFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl Feed for DemoFeed {
    fn poll(&mut self) -> anyhow::Result<FeedUpdate> {
        let entities = (!self.delivered_entities).then(|| self.entities.clone());
        self.delivered_entities = true;
        Ok(FeedUpdate {
            entities,
            health: Some(self.roll_health()),
        })
    }

    fn describe(&self) -> String {
        "demo feed".into()
    }
}

fn sample_entities() -> Vec<Entity> {
    vec![
        Entity::new("gateway", "Edge Gateway").with_depends_on("auth,api"),
        Entity::new("web", "Web Frontend")
            .with_depends_on("gateway")
            .with_connected_to("cdn"),
        Entity::new("cdn", "CDN"),
        Entity::new("api", "Public API")
            .with_depends_on("postgres,redis,search")
            .with_connected_to("queue"),
        Entity::new("auth", "Auth Service").with_depends_on("postgres,ldap"),
        Entity::new("postgres", "PostgreSQL").with_connected_to("replica"),
        Entity::new("replica", "PG Replica").with_connected_to("postgres"),
        Entity::new("redis", "Redis"),
        Entity::new("search", "Search").with_depends_on("queue"),
        Entity::new("queue", "Job Queue"),
        Entity::new("worker", "Workers").with_depends_on("queue,postgres,mailer"),
        Entity::new("mailer", "Mailer"),
        Entity::new("batch", "Nightly Batch").with_depends_on("worker"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities_delivered_once_health_every_poll() {
        let mut feed = DemoFeed::with_seed(7);
        let first = feed.poll().unwrap();
        let entities = first.entities.unwrap();
        assert_eq!(first.health.unwrap().len(), entities.len());

        let second = feed.poll().unwrap();
        assert!(second.entities.is_none());
        assert!(second.health.is_some());
    }

    #[test]
    fn batch_is_always_disabled() {
        let mut feed = DemoFeed::with_seed(1);
        for _ in 0..5 {
            let health = feed.poll().unwrap().health.unwrap();
            assert_eq!(health["batch"].disabled, Some(true));
        }
    }

    #[test]
    fn sample_keys_are_unique() {
        let entities = sample_entities();
        let mut keys: Vec<&str> = entities.iter().map(|e| e.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), entities.len());
    }
}
