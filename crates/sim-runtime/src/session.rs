//! A running game: static data, the player, storage and the notification
//! sink, driven one [`Command`] at a time.

use crate::command::Command;
use crate::notify::{Notification, NotificationSink, Severity};
use persistence::{Gateway, StorageError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use sim_combat::{
    attack_targets, place_command_post, resolve_ai_battle, resolve_territory_attack,
    AiBattleReport, TerritoryBattleReport,
};
use sim_core::{
    Catalog, CatalogError, GameError, PlayerState, RulesConfig, TerritoryId, TerritoryMap,
    Timestamp,
};
use sim_econ::{
    apply_experience, claim_mission, collect_income, mission_board, purchase_unit, research,
    standing, IncomeReport, LevelUp, MissionClaim, MissionStatus, Purchase, ResearchReport,
    Standing,
};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Everything that stays fixed during a game.
#[derive(Clone, Debug)]
pub struct GameData {
    /// Countries, units, technologies, missions and levels.
    pub catalog: Catalog,
    /// Tunable constants.
    pub rules: RulesConfig,
    /// Conquerable territories.
    pub map: TerritoryMap,
}

impl GameData {
    /// The data bundled with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Ok(Self {
            catalog: Catalog::builtin()?,
            rules: RulesConfig::default(),
            map: TerritoryMap::builtin()?,
        })
    }
}

/// Which kind of battle a log entry describes.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BattleKind {
    /// Fight against a generated army.
    Abstract {
        /// Final attack strength.
        attack: f64,
        /// Final defense strength.
        defense: f64,
        /// Reward or loss.
        amount: u64,
    },
    /// Attack on a map territory.
    Territorial {
        /// Territory attacked.
        target: TerritoryId,
        /// Odds of the attack.
        win_probability: f64,
        /// Score change applied.
        score_delta: i64,
    },
}

/// One entry of the battle log.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BattleRecord {
    /// When the battle was fought.
    pub at: Timestamp,
    /// Attacker won.
    pub victory: bool,
    /// Mode-specific details.
    pub kind: BattleKind,
}

/// Result of a dispatched command.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Country chosen.
    CountrySelected {
        /// Country display name.
        country: String,
        /// Starting treasury.
        treasury: u64,
    },
    /// Units bought.
    Purchased(Purchase),
    /// Technology researched.
    Researched(ResearchReport),
    /// Income collected.
    Income(IncomeReport),
    /// Abstract battle fought.
    AiBattle(AiBattleReport),
    /// Command post placed.
    CommandPostPlaced {
        /// Territory id.
        territory: TerritoryId,
        /// Territory display name.
        name: String,
    },
    /// Territory attacked.
    TerritoryBattle {
        /// Battle details.
        report: TerritoryBattleReport,
        /// Territory display name.
        name: String,
    },
    /// Mission reward taken.
    MissionClaimed(MissionClaim),
    /// Message recorded.
    MessageRecorded {
        /// Messages over the whole game.
        total: u64,
    },
    /// Player summary.
    Standing(Standing),
    /// Mission progress.
    Missions(Vec<MissionStatus>),
    /// Display names of attackable territories.
    Targets(Vec<String>),
    /// Recent battles, newest first.
    History(Vec<BattleRecord>),
}

impl Outcome {
    /// Level change caused by the command, if any.
    pub fn level_up(&self) -> Option<LevelUp> {
        match self {
            Outcome::Researched(r) => r.level_up,
            Outcome::Income(r) => r.level_up,
            Outcome::AiBattle(r) => r.level_up,
            Outcome::MissionClaimed(c) => c.level_up,
            _ => None,
        }
    }

    /// Message and severity for the notification sink.
    pub fn describe(&self) -> (String, Severity) {
        match self {
            Outcome::CountrySelected { country, treasury } => (
                format!("Now commanding {country} with a treasury of {treasury}"),
                Severity::Success,
            ),
            Outcome::Purchased(p) => (
                format!(
                    "Bought {} {} for {} ({} owned, {} left today)",
                    p.quantity, p.asset, p.total_cost, p.owned, p.remaining_today
                ),
                Severity::Success,
            ),
            Outcome::Researched(r) => (
                format!(
                    "Researched {} for {} (+{} XP)",
                    r.tech, r.cost, r.experience_gained
                ),
                Severity::Success,
            ),
            Outcome::Income(r) => (
                format!("Collected {} income (+{} XP)", r.amount, r.experience_gained),
                Severity::Success,
            ),
            Outcome::AiBattle(r) if r.victory => (
                format!(
                    "Victory: attack {:.0} against defense {:.0}, reward {}",
                    r.attack, r.defense, r.amount
                ),
                Severity::Success,
            ),
            Outcome::AiBattle(r) => (
                format!(
                    "Defeat: attack {:.0} against defense {:.0}, lost {}",
                    r.attack, r.defense, r.amount
                ),
                Severity::Info,
            ),
            Outcome::CommandPostPlaced { name, .. } => {
                (format!("Command post established in {name}"), Severity::Success)
            }
            Outcome::TerritoryBattle { report, name } if report.victory => (
                format!(
                    "{name} conquered at {:.0}% odds, score {:+}",
                    report.win_probability * 100.0,
                    report.score_delta
                ),
                Severity::Success,
            ),
            Outcome::TerritoryBattle { report, name } => (
                format!(
                    "Attack on {name} repelled at {:.0}% odds, score {:+}",
                    report.win_probability * 100.0,
                    report.score_delta
                ),
                Severity::Info,
            ),
            Outcome::MissionClaimed(c) => (
                format!(
                    "Mission {} complete: +{} treasury, +{} XP",
                    c.id, c.points, c.experience_gained
                ),
                Severity::Success,
            ),
            Outcome::MessageRecorded { total } => {
                (format!("Message sent ({total} total)"), Severity::Info)
            }
            Outcome::Standing(s) => (
                format!(
                    "{} of {}: level {}, power {}, treasury {}, {}W/{}L, {} territories, score {}",
                    s.name,
                    s.country.as_deref().unwrap_or("no country"),
                    s.level,
                    s.power,
                    s.treasury,
                    s.battles_won,
                    s.battles_lost,
                    s.territories,
                    s.score
                ),
                Severity::Info,
            ),
            Outcome::Missions(board) => {
                let rows: Vec<String> = board
                    .iter()
                    .map(|m| {
                        let mark = if m.claimed { " (claimed)" } else { "" };
                        format!("{} {}/{}{mark}", m.id, m.progress.min(m.target), m.target)
                    })
                    .collect();
                (rows.join(", "), Severity::Info)
            }
            Outcome::Targets(names) if names.is_empty() => {
                ("No territories in reach".to_string(), Severity::Info)
            }
            Outcome::Targets(names) => (format!("In reach: {}", names.join(", ")), Severity::Info),
            Outcome::History(log) => (format!("{} battles on record", log.len()), Severity::Info),
        }
    }

    /// Notifications to emit for this outcome, level-ups included.
    pub fn notifications(&self) -> Vec<Notification> {
        let (message, severity) = self.describe();
        let mut out = vec![Notification::new(message, severity)];
        if let Some(up) = self.level_up() {
            out.push(Notification::new(
                format!("Level up: {} -> {}", up.from, up.to),
                Severity::Info,
            ));
        }
        out
    }
}

/// The single writer of a player's state.
pub struct Session<G, S> {
    data: GameData,
    state: PlayerState,
    gateway: G,
    sink: S,
    rng: ChaCha8Rng,
    battle_log: VecDeque<BattleRecord>,
    last_save: Option<Timestamp>,
}

fn make_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn resolve_territory(map: &TerritoryMap, query: &str) -> Result<TerritoryId, GameError> {
    map.resolve(query)
        .map(|t| t.id.clone())
        .ok_or_else(|| GameError::UnknownTerritory(query.to_string()))
}

fn push_battle(log: &mut VecDeque<BattleRecord>, capacity: usize, record: BattleRecord) {
    log.push_front(record);
    log.truncate(capacity);
}

impl<G: Gateway, S: NotificationSink> Session<G, S> {
    /// Start a new game. Nothing is saved until the first save trigger.
    pub fn new_game(
        data: GameData,
        name: &str,
        gateway: G,
        sink: S,
        seed: Option<u64>,
    ) -> Result<Self, GameError> {
        let state = PlayerState::new(name, &data.rules)?;
        info!(player = %state.name, "new game");
        Ok(Self::with_state(data, state, gateway, sink, seed))
    }

    /// Continue the stored game, if there is one.
    pub fn resume(
        data: GameData,
        gateway: G,
        sink: S,
        seed: Option<u64>,
    ) -> Result<Option<Self>, StorageError> {
        let Some(mut state) = gateway.load()? else {
            return Ok(None);
        };
        // Thresholds may have changed since the save was written.
        apply_experience(&mut state, &data.catalog, 0);
        info!(player = %state.name, level = state.level, "game resumed");
        Ok(Some(Self::with_state(data, state, gateway, sink, seed)))
    }

    fn with_state(data: GameData, state: PlayerState, gateway: G, sink: S, seed: Option<u64>) -> Self {
        Self {
            data,
            state,
            gateway,
            sink,
            rng: make_rng(seed),
            battle_log: VecDeque::new(),
            last_save: None,
        }
    }

    /// Current player state.
    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Static game data.
    pub fn data(&self) -> &GameData {
        &self.data
    }

    /// Storage backend.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Notification sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the sink, e.g. to drain buffered notifications.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Recent battles, newest first.
    pub fn battle_log(&self) -> impl Iterator<Item = &BattleRecord> {
        self.battle_log.iter()
    }

    /// Time of the last successful save.
    pub fn last_save(&self) -> Option<Timestamp> {
        self.last_save
    }

    /// Run one command, report its outcome to the sink and save after
    /// every successful mutation. Rejected commands leave the state as it
    /// was.
    pub fn dispatch(&mut self, command: Command, now: Timestamp) -> Result<Outcome, GameError> {
        let mutates = command.mutates();
        match self.execute(command, now) {
            Ok(outcome) => {
                for notification in outcome.notifications() {
                    self.sink.notify(notification);
                }
                if mutates {
                    self.save(now);
                }
                Ok(outcome)
            }
            Err(err) => {
                debug!(%err, "command rejected");
                self.sink
                    .notify(Notification::new(err.to_string(), Severity::Error));
                Err(err)
            }
        }
    }

    /// Periodic auto-save: saves once the configured interval has passed
    /// since the last successful save. Returns true when a save succeeded.
    pub fn tick(&mut self, now: Timestamp) -> bool {
        let due = match self.last_save {
            None => true,
            Some(at) => now.saturating_sub(at) >= self.data.rules.autosave_interval_secs,
        };
        due && self.save(now)
    }

    /// Save now. Failures are logged and retried on the next trigger.
    pub fn save(&mut self, now: Timestamp) -> bool {
        match self.gateway.save(&self.state, now) {
            Ok(()) => {
                self.last_save = Some(now);
                true
            }
            Err(err) => {
                warn!(%err, "save failed, will retry");
                false
            }
        }
    }

    fn execute(&mut self, command: Command, now: Timestamp) -> Result<Outcome, GameError> {
        let GameData { catalog, rules, map } = &self.data;
        let state = &mut self.state;
        let outcome = match command {
            Command::SelectCountry { country } => {
                let chosen = state.select_country(catalog, &country)?;
                Outcome::CountrySelected {
                    country: chosen.name.clone(),
                    treasury: state.treasury,
                }
            }
            Command::Buy { asset, quantity } => {
                Outcome::Purchased(purchase_unit(state, catalog, rules, &asset, quantity, now)?)
            }
            Command::Research { tech } => Outcome::Researched(research(state, catalog, &tech)?),
            Command::CollectIncome => Outcome::Income(collect_income(state, catalog, rules, now)?),
            Command::Battle => {
                let report = resolve_ai_battle(state, catalog, rules, &mut self.rng)?;
                push_battle(
                    &mut self.battle_log,
                    rules.battle_log_capacity,
                    BattleRecord {
                        at: now,
                        victory: report.victory,
                        kind: BattleKind::Abstract {
                            attack: report.attack,
                            defense: report.defense,
                            amount: report.amount,
                        },
                    },
                );
                Outcome::AiBattle(report)
            }
            Command::PlaceCommandPost { territory } => {
                let id = resolve_territory(map, &territory)?;
                let placed = place_command_post(state, map, &id)?;
                Outcome::CommandPostPlaced {
                    territory: placed.id.clone(),
                    name: placed.name.clone(),
                }
            }
            Command::Attack { territory } => {
                let id = resolve_territory(map, &territory)?;
                let report =
                    resolve_territory_attack(state, catalog, rules, map, &id, &mut self.rng)?;
                push_battle(
                    &mut self.battle_log,
                    rules.battle_log_capacity,
                    BattleRecord {
                        at: now,
                        victory: report.victory,
                        kind: BattleKind::Territorial {
                            target: id.clone(),
                            win_probability: report.win_probability,
                            score_delta: report.score_delta,
                        },
                    },
                );
                let name = map
                    .get(&id)
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| id.to_string());
                Outcome::TerritoryBattle { report, name }
            }
            Command::ClaimMission { mission } => {
                Outcome::MissionClaimed(claim_mission(state, catalog, rules, &mission, now)?)
            }
            Command::Message => Outcome::MessageRecorded {
                total: state.record_message(now),
            },
            Command::Status => Outcome::Standing(standing(state, catalog, rules)),
            Command::Missions => Outcome::Missions(mission_board(state, catalog, rules, now)),
            Command::Targets => Outcome::Targets(
                attack_targets(state, map)
                    .into_iter()
                    .map(|t| t.name.clone())
                    .collect(),
            ),
            Command::History => Outcome::History(self.battle_log.iter().cloned().collect()),
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NullSink;
    use persistence::MemoryStore;
    use sim_core::AssetId;

    const NOW: Timestamp = 1_700_000_000;

    type TestSession = Session<MemoryStore, Vec<Notification>>;

    fn session() -> TestSession {
        let data = GameData::builtin().unwrap();
        Session::new_game(data, "Tester", MemoryStore::default(), Vec::new(), Some(7)).unwrap()
    }

    fn run(s: &mut TestSession, line: &str, now: Timestamp) -> Result<Outcome, GameError> {
        s.dispatch(line.parse().unwrap(), now)
    }

    #[test]
    fn iran_scenario_saves_after_each_mutation() {
        let mut s = session();
        run(&mut s, "country iran", NOW).unwrap();
        assert_eq!(s.state().treasury, 500_000);
        let out = run(&mut s, "buy militia 2", NOW).unwrap();
        assert!(matches!(out, Outcome::Purchased(ref p) if p.total_cost == 30_000));
        assert_eq!(s.state().treasury, 470_000);
        assert_eq!(s.state().owned(&AssetId::from("militia")), 2);

        assert_eq!(s.gateway().saves, 2);
        let saved = s.gateway().load().unwrap().unwrap();
        assert_eq!(&saved, s.state());
        assert_eq!(s.last_save(), Some(NOW));
        assert_eq!(s.sink().len(), 2);
        assert!(s.sink().iter().all(|n| n.severity == Severity::Success));
    }

    #[test]
    fn rejection_notifies_and_skips_save() {
        let mut s = session();
        let err = run(&mut s, "battle", NOW).unwrap_err();
        assert_eq!(err, GameError::CountryNotSelected);
        run(&mut s, "country usa", NOW).unwrap();
        assert_eq!(run(&mut s, "battle", NOW).unwrap_err(), GameError::NoForce);
        assert_eq!(s.gateway().saves, 1);
        let last = s.sink().last().unwrap();
        assert_eq!(last.severity, Severity::Error);
        assert_eq!(last.message, "no forces available for battle");
    }

    #[test]
    fn read_only_commands_do_not_save() {
        let mut s = session();
        run(&mut s, "country china", NOW).unwrap();
        let saves = s.gateway().saves;
        assert!(matches!(run(&mut s, "status", NOW).unwrap(), Outcome::Standing(_)));
        assert!(matches!(run(&mut s, "missions", NOW).unwrap(), Outcome::Missions(ref m) if m.len() == 4));
        assert_eq!(s.gateway().saves, saves);
    }

    #[test]
    fn conquest_by_display_name() {
        let mut s = session();
        run(&mut s, "country germany", NOW).unwrap();
        run(&mut s, "buy infantry 10", NOW).unwrap();
        let out = run(&mut s, "base france", NOW).unwrap();
        assert_eq!(
            out,
            Outcome::CommandPostPlaced {
                territory: TerritoryId::from("fra"),
                name: "France".into()
            }
        );
        assert_eq!(run(&mut s, "base Spain", NOW).unwrap_err(), GameError::AlreadyPlaced);
        assert_eq!(run(&mut s, "attack France", NOW).unwrap_err(), GameError::AlreadyOwned);
        assert_eq!(run(&mut s, "attack China", NOW).unwrap_err(), GameError::NotAdjacent);
        assert_eq!(
            run(&mut s, "attack Atlantis", NOW).unwrap_err(),
            GameError::UnknownTerritory("Atlantis".into())
        );

        let out = run(&mut s, "attack Spain", NOW).unwrap();
        let Outcome::TerritoryBattle { report, name } = out else {
            panic!("expected a territorial battle");
        };
        assert_eq!(name, "Spain");
        assert_eq!(report.victory, s.state().owned_territories.contains(&TerritoryId::from("esp")));
        assert_eq!(s.battle_log().count(), 1);
    }

    #[test]
    fn battle_log_is_bounded_newest_first() {
        let data = GameData {
            rules: RulesConfig {
                battle_log_capacity: 3,
                ..RulesConfig::default()
            },
            ..GameData::builtin().unwrap()
        };
        let mut s =
            Session::new_game(data, "Tester", MemoryStore::default(), Vec::new(), Some(1)).unwrap();
        run(&mut s, "country russia", NOW).unwrap();
        run(&mut s, "buy infantry 20", NOW).unwrap();
        for i in 0..5 {
            run(&mut s, "battle", NOW + i).unwrap();
        }
        let at: Vec<Timestamp> = s.battle_log().map(|b| b.at).collect();
        assert_eq!(at, vec![NOW + 4, NOW + 3, NOW + 2]);
        let Outcome::History(log) = run(&mut s, "history", NOW).unwrap() else {
            panic!("expected history");
        };
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn save_failures_are_swallowed_and_retried() {
        let data = GameData::builtin().unwrap();
        let store = MemoryStore {
            fail_saves: true,
            ..MemoryStore::default()
        };
        let mut s = Session::new_game(data, "Tester", store, Vec::new(), Some(3)).unwrap();
        assert!(run(&mut s, "country usa", NOW).is_ok());
        assert_eq!(s.last_save(), None);
        assert!(!s.tick(NOW + 1));

        s.gateway.fail_saves = false;
        assert!(s.tick(NOW + 2));
        assert_eq!(s.last_save(), Some(NOW + 2));
        assert!(!s.tick(NOW + 31));
        assert!(s.tick(NOW + 32));
        assert_eq!(s.gateway().saves, 2);
    }

    #[test]
    fn resume_restores_saved_player() {
        let mut s = session();
        run(&mut s, "country iran", NOW).unwrap();
        run(&mut s, "message", NOW).unwrap();
        let store = s.gateway().clone();

        let resumed = Session::resume(GameData::builtin().unwrap(), store, Vec::<Notification>::new(), None)
            .unwrap()
            .unwrap();
        assert_eq!(resumed.state().total_messages, 1);
        assert_eq!(resumed.state().country, Some("iran".into()));

        let empty = Session::resume(
            GameData::builtin().unwrap(),
            MemoryStore::default(),
            NullSink,
            None,
        )
        .unwrap();
        assert!(empty.is_none());
    }

    #[test]
    fn level_up_is_announced() {
        let mut s = session();
        run(&mut s, "country usa", NOW).unwrap();
        run(&mut s, "income", NOW).unwrap();
        assert!(s.state().level > 1);
        assert!(s
            .sink()
            .iter()
            .any(|n| n.severity == Severity::Info && n.message.starts_with("Level up")));
    }
}
