//! Run Service - starts runs, computes floor affinities in the background and
//! finalizes runs into the character pool
//!
//! Each run gets one spawned enrichment task that resolves floors 1 through 9
//! strictly in order. Pollers only ever read the registry, so a floor is
//! either absent or complete.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::application::dto::{FloorResponseDto, RunStatusResponseDto, StartRunResponseDto};
use crate::application::ports::outbound::{
    AffinityQuery, AffinityResolverPort, CharacterPoolPort, PoolError,
};
use crate::domain::entities::{CharacterRecord, FloorAppendError, RunSession, FLOORS_PER_RUN};
use crate::domain::value_objects::{AffinityTable, RunId};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Character pool holds {available} characters, a run needs {required}")]
    InsufficientPool { available: usize, required: usize },
    #[error("Run not found: {0}")]
    NotFound(RunId),
    #[error("Invalid floor {0}, floors are numbered 1 to 9")]
    InvalidFloor(usize),
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// In-memory store of active runs
#[derive(Debug, Default)]
pub struct RunRegistry {
    runs: HashMap<RunId, RunSession>,
}

pub type SharedRunRegistry = Arc<RwLock<RunRegistry>>;

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, session: RunSession) {
        self.runs.insert(session.id, session);
    }

    pub fn get(&self, id: &RunId) -> Option<&RunSession> {
        self.runs.get(id)
    }

    pub fn remove(&mut self, id: &RunId) -> Option<RunSession> {
        self.runs.remove(id)
    }

    /// Append a floor table to a run.
    ///
    /// Returns `None` when the run no longer exists.
    pub fn push_floor(
        &mut self,
        id: &RunId,
        floor: usize,
        table: AffinityTable,
    ) -> Option<Result<(), FloorAppendError>> {
        self.runs
            .get_mut(id)
            .map(|session| session.push_floor(floor, table))
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

pub struct RunService<P: CharacterPoolPort, A: AffinityResolverPort> {
    pool: Arc<P>,
    resolver: Arc<A>,
    registry: SharedRunRegistry,
}

impl<P, A> RunService<P, A>
where
    P: CharacterPoolPort + 'static,
    A: AffinityResolverPort + 'static,
{
    pub fn new(pool: Arc<P>, resolver: Arc<A>, registry: SharedRunRegistry) -> Self {
        Self {
            pool,
            resolver,
            registry,
        }
    }

    /// Sample nine enemies from the pool and start computing floor tables.
    ///
    /// Returns as soon as the run is registered; floors appear as they finish.
    #[instrument(skip(self, players), fields(players = players.len()))]
    pub async fn start_run(
        &self,
        players: Vec<CharacterRecord>,
    ) -> Result<StartRunResponseDto, RunError> {
        let pool = self.pool.list().await?;
        if pool.len() < FLOORS_PER_RUN {
            return Err(RunError::InsufficientPool {
                available: pool.len(),
                required: FLOORS_PER_RUN,
            });
        }

        let enemies: Vec<CharacterRecord> = pool
            .choose_multiple(&mut rand::thread_rng(), FLOORS_PER_RUN)
            .cloned()
            .collect();

        let run_id = RunId::new();
        self.registry
            .write()
            .await
            .insert(RunSession::new(run_id, enemies.clone(), players));

        tokio::spawn(enrich_run(
            Arc::clone(&self.resolver),
            Arc::clone(&self.registry),
            run_id,
        ));

        info!(run_id = %run_id, pool_size = pool.len(), "Started run");
        Ok(StartRunResponseDto { run_id, enemies })
    }

    /// Poll one floor. Never changes any state.
    pub async fn get_floor(
        &self,
        run_id: RunId,
        floor: usize,
    ) -> Result<FloorResponseDto, RunError> {
        if !(1..=FLOORS_PER_RUN).contains(&floor) {
            return Err(RunError::InvalidFloor(floor));
        }

        let registry = self.registry.read().await;
        let session = registry.get(&run_id).ok_or(RunError::NotFound(run_id))?;

        match (session.enemy(floor), session.floor_table(floor)) {
            (Some(enemy), Some(table)) => Ok(FloorResponseDto::Completed {
                enemy: enemy.clone(),
                affinity_table: table.clone(),
            }),
            _ => Ok(FloorResponseDto::Calculating),
        }
    }

    pub async fn run_status(&self, run_id: RunId) -> Result<RunStatusResponseDto, RunError> {
        let registry = self.registry.read().await;
        registry
            .get(&run_id)
            .map(RunStatusResponseDto::from)
            .ok_or(RunError::NotFound(run_id))
    }

    /// Save the winners into the pool and forget the run.
    ///
    /// Succeeds whether or not the run is still registered.
    #[instrument(skip(self, winners), fields(winners = winners.len()))]
    pub async fn complete_run(
        &self,
        run_id: RunId,
        winners: Vec<CharacterRecord>,
    ) -> Result<Vec<CharacterRecord>, RunError> {
        let stored = self.pool.append(winners).await?;

        let removed = self.registry.write().await.remove(&run_id);
        if removed.is_none() {
            debug!(run_id = %run_id, "Completed run was not registered");
        }

        info!(run_id = %run_id, saved = stored.len(), "Completed run");
        Ok(stored)
    }
}

/// Compute floors 1..=9 for a run, stopping at the first resolver failure.
///
/// The registry lock is only taken to read the rosters and to append a
/// finished table.
pub(crate) async fn enrich_run<A: AffinityResolverPort>(
    resolver: Arc<A>,
    registry: SharedRunRegistry,
    run_id: RunId,
) {
    let (enemies, players) = {
        let registry = registry.read().await;
        match registry.get(&run_id) {
            Some(session) => (session.enemies().to_vec(), session.players().to_vec()),
            None => return,
        }
    };

    for (index, enemy) in enemies.iter().enumerate().take(FLOORS_PER_RUN) {
        let floor = index + 1;
        let query = floor_query(&players, enemy);

        let triples = match resolver.resolve(&query).await {
            Ok(triples) => triples,
            Err(e) => {
                warn!(
                    run_id = %run_id,
                    floor,
                    error = %e,
                    "Affinity resolution failed, halting run"
                );
                return;
            }
        };
        let table = AffinityTable::from_triples(&triples);
        if table.is_empty() {
            warn!(run_id = %run_id, floor, "Resolver returned no usable multipliers");
        }

        match registry.write().await.push_floor(&run_id, floor, table) {
            Some(Ok(())) => debug!(run_id = %run_id, floor, "Floor ready"),
            Some(Err(e)) => {
                warn!(run_id = %run_id, floor, error = %e, "Rejected floor table");
                return;
            }
            None => {
                debug!(run_id = %run_id, floor, "Run finalized, discarding floor table");
                return;
            }
        }
    }

    info!(run_id = %run_id, "All floors ready");
}

/// Distinct type tags for one floor's encounter, sorted
fn floor_query(players: &[CharacterRecord], enemy: &CharacterRecord) -> AffinityQuery {
    let player_skill_types: BTreeSet<&str> =
        players.iter().flat_map(|p| p.skill_types()).collect();
    let player_character_types: BTreeSet<&str> =
        players.iter().map(|p| p.character_type.as_str()).collect();
    let enemy_skill_types: BTreeSet<&str> = enemy.skill_types().collect();

    AffinityQuery {
        player_skill_types: into_tags(player_skill_types),
        enemy_character_types: vec![enemy.character_type.clone()],
        enemy_skill_types: into_tags(enemy_skill_types),
        player_character_types: into_tags(player_character_types),
    }
}

fn into_tags(tags: BTreeSet<&str>) -> Vec<String> {
    tags.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::AffinityError;
    use crate::application::services::character_service::tests::MockPool;
    use crate::domain::entities::character::test_support::character;
    use crate::domain::value_objects::affinity::AffinityTriple;
    use crate::domain::value_objects::AffinityTriples;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Says every player skill type is super effective against the enemy
    #[derive(Default)]
    struct TableResolver {
        queries: Mutex<Vec<AffinityQuery>>,
    }

    #[async_trait]
    impl AffinityResolverPort for TableResolver {
        async fn resolve(&self, query: &AffinityQuery) -> Result<AffinityTriples, AffinityError> {
            self.queries.lock().unwrap().push(query.clone());
            let mut triples = AffinityTriples::default();
            for attacker in &query.player_skill_types {
                for defender in &query.enemy_character_types {
                    triples
                        .player_vs_enemy
                        .push(AffinityTriple::new(attacker.clone(), defender.clone(), 2.0));
                }
            }
            Ok(triples)
        }
    }

    /// Fails on the given 1-based call
    struct FailingResolver {
        fail_on: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AffinityResolverPort for FailingResolver {
        async fn resolve(&self, _query: &AffinityQuery) -> Result<AffinityTriples, AffinityError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.fail_on {
                Err(AffinityError::InvalidResponse("garbage".to_string()))
            } else {
                Ok(AffinityTriples::default())
            }
        }
    }

    /// Blocks each call until a permit is added
    struct GatedResolver {
        gate: Semaphore,
        calls: AtomicUsize,
    }

    impl GatedResolver {
        fn new() -> Self {
            Self {
                gate: Semaphore::new(0),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AffinityResolverPort for GatedResolver {
        async fn resolve(&self, _query: &AffinityQuery) -> Result<AffinityTriples, AffinityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate
                .acquire()
                .await
                .map_err(|e| AffinityError::RequestFailed(e.to_string()))?
                .forget();
            Ok(AffinityTriples::default())
        }
    }

    fn pool_of(size: usize) -> Arc<MockPool> {
        let records = (0..size)
            .map(|i| character(&format!("Enemy {}", i), "Rock", "Stone"))
            .collect();
        Arc::new(MockPool::with(records))
    }

    fn players() -> Vec<CharacterRecord> {
        vec![
            character("Hero", "Fire", "Fire"),
            character("Sidekick", "Water", "Water"),
        ]
    }

    fn service<A: AffinityResolverPort + 'static>(
        pool: Arc<MockPool>,
        resolver: Arc<A>,
    ) -> RunService<MockPool, A> {
        RunService::new(pool, resolver, Arc::new(RwLock::new(RunRegistry::new())))
    }

    async fn wait_for_floors<P, A>(service: &RunService<P, A>, run_id: RunId, floors: usize)
    where
        P: CharacterPoolPort + 'static,
        A: AffinityResolverPort + 'static,
    {
        for _ in 0..500 {
            if service.run_status(run_id).await.unwrap().floors_ready >= floors {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("Run {} never reached {} floors", run_id, floors);
    }

    async fn wait_for_calls(calls: &AtomicUsize, expected: usize) {
        for _ in 0..500 {
            if calls.load(Ordering::SeqCst) >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("Resolver never reached {} calls", expected);
    }

    #[tokio::test]
    async fn test_start_run_with_exactly_nine_uses_all() {
        let pool = pool_of(9);
        let pool_ids: HashSet<_> = pool.list().await.unwrap().iter().map(|c| c.id).collect();
        let service = service(pool, Arc::new(TableResolver::default()));

        let started = service.start_run(players()).await.unwrap();

        let enemy_ids: HashSet<_> = started.enemies.iter().map(|c| c.id).collect();
        assert_eq!(started.enemies.len(), 9);
        assert_eq!(enemy_ids, pool_ids);
    }

    #[tokio::test]
    async fn test_start_run_with_eight_fails() {
        let service = service(pool_of(8), Arc::new(TableResolver::default()));

        let err = service.start_run(players()).await.unwrap_err();

        assert!(matches!(
            err,
            RunError::InsufficientPool {
                available: 8,
                required: 9
            }
        ));
        assert!(service.registry.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_enrichment_fills_all_floors_in_order() {
        let resolver = Arc::new(TableResolver::default());
        let service = service(pool_of(20), resolver.clone());

        let started = service.start_run(players()).await.unwrap();
        wait_for_floors(&service, started.run_id, 9).await;

        let status = service.run_status(started.run_id).await.unwrap();
        assert_eq!(status.status, crate::domain::entities::RunStatus::Ready);

        for floor in 1..=9 {
            match service.get_floor(started.run_id, floor).await.unwrap() {
                FloorResponseDto::Completed {
                    enemy,
                    affinity_table,
                } => {
                    assert_eq!(enemy.id, started.enemies[floor - 1].id);
                    assert_eq!(affinity_table.player_multiplier("Fire", "Rock"), Some(2.0));
                    assert_eq!(affinity_table.player_multiplier("Water", "Rock"), Some(2.0));
                }
                FloorResponseDto::Calculating => panic!("Floor {} not ready", floor),
            }
        }

        let queries = resolver.queries.lock().unwrap();
        assert_eq!(queries.len(), 9);
        assert_eq!(
            queries[0],
            AffinityQuery {
                player_skill_types: vec!["Fire".to_string(), "Water".to_string()],
                enemy_character_types: vec!["Rock".to_string()],
                enemy_skill_types: vec!["Stone".to_string()],
                player_character_types: vec!["Fire".to_string(), "Water".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn test_failure_halts_enrichment_at_prefix() {
        let resolver = Arc::new(FailingResolver {
            fail_on: 4,
            calls: AtomicUsize::new(0),
        });
        let registry = Arc::new(RwLock::new(RunRegistry::new()));
        let service = RunService::new(pool_of(9), resolver.clone(), registry.clone());
        let run_id = RunId::new();
        let enemies = pool_of(9).list().await.unwrap();
        registry
            .write()
            .await
            .insert(RunSession::new(run_id, enemies, players()));

        enrich_run(resolver.clone(), registry.clone(), run_id).await;

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 4);
        let status = service.run_status(run_id).await.unwrap();
        assert_eq!(status.floors_ready, 3);
        assert_eq!(status.status, crate::domain::entities::RunStatus::Enriching);
        for floor in 1..=3 {
            assert!(matches!(
                service.get_floor(run_id, floor).await.unwrap(),
                FloorResponseDto::Completed { .. }
            ));
        }
        for floor in 4..=9 {
            assert_eq!(
                service.get_floor(run_id, floor).await.unwrap(),
                FloorResponseDto::Calculating
            );
        }
    }

    #[tokio::test]
    async fn test_polling_is_idempotent() {
        let resolver = Arc::new(GatedResolver::new());
        let service = service(pool_of(12), resolver.clone());
        let started = service.start_run(players()).await.unwrap();

        for _ in 0..3 {
            assert_eq!(
                service.get_floor(started.run_id, 1).await.unwrap(),
                FloorResponseDto::Calculating
            );
        }

        resolver.gate.add_permits(1);
        wait_for_floors(&service, started.run_id, 1).await;

        let first = service.get_floor(started.run_id, 1).await.unwrap();
        let second = service.get_floor(started.run_id, 1).await.unwrap();
        assert!(matches!(first, FloorResponseDto::Completed { .. }));
        assert_eq!(first, second);
        assert_eq!(
            service.get_floor(started.run_id, 2).await.unwrap(),
            FloorResponseDto::Calculating
        );
    }

    #[tokio::test]
    async fn test_invalid_floor_checked_before_run() {
        let service = service(pool_of(9), Arc::new(TableResolver::default()));
        let unknown = RunId::new();

        assert!(matches!(
            service.get_floor(unknown, 0).await,
            Err(RunError::InvalidFloor(0))
        ));
        assert!(matches!(
            service.get_floor(unknown, 10).await,
            Err(RunError::InvalidFloor(10))
        ));
        assert!(matches!(
            service.get_floor(unknown, 1).await,
            Err(RunError::NotFound(id)) if id == unknown
        ));
    }

    #[tokio::test]
    async fn test_complete_run_twice_saves_fresh_ids() {
        let pool = pool_of(9);
        let service = service(pool.clone(), Arc::new(GatedResolver::new()));
        let started = service.start_run(players()).await.unwrap();
        let winners = players();
        let winner_ids: HashSet<_> = winners.iter().map(|c| c.id).collect();

        let first = service
            .complete_run(started.run_id, winners.clone())
            .await
            .unwrap();
        let second = service.complete_run(started.run_id, winners).await.unwrap();

        assert!(matches!(
            service.run_status(started.run_id).await,
            Err(RunError::NotFound(_))
        ));
        let stored = pool.list().await.unwrap();
        assert_eq!(stored.len(), 13);
        let fresh: HashSet<_> = first.iter().chain(&second).map(|c| c.id).collect();
        assert_eq!(fresh.len(), 4);
        assert!(fresh.is_disjoint(&winner_ids));
        assert!(stored.iter().filter(|c| c.name == "Hero").count() == 2);
    }

    #[tokio::test]
    async fn test_late_floor_after_completion_is_discarded() {
        let resolver = Arc::new(GatedResolver::new());
        let registry = Arc::new(RwLock::new(RunRegistry::new()));
        let service = RunService::new(pool_of(9), resolver.clone(), registry.clone());
        let run_id = RunId::new();
        let enemies = pool_of(9).list().await.unwrap();
        registry
            .write()
            .await
            .insert(RunSession::new(run_id, enemies, players()));

        let task = tokio::spawn(enrich_run(resolver.clone(), registry.clone(), run_id));
        wait_for_calls(&resolver.calls, 1).await;

        service.complete_run(run_id, Vec::new()).await.unwrap();
        resolver.gate.add_permits(FLOORS_PER_RUN);
        task.await.unwrap();

        assert!(registry.read().await.is_empty());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registry_push_to_missing_run() {
        let mut registry = RunRegistry::new();

        assert!(registry
            .push_floor(&RunId::new(), 1, AffinityTable::default())
            .is_none());
        assert_eq!(registry.len(), 0);
    }
}
