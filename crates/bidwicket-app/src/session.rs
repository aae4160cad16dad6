// Interactive auction session.
//
// A single task owns the AuctionLedger and applies commands one at a time
// from an mpsc queue, so ledger operations never interleave. The same task
// runs the lot countdown: opening a lot or accepting a bid re-arms the
// deadline, and when it passes the session finalizes the lot itself.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use bidwicket_core::auction::{AuctionError, AuctionLedger, HistoryEntry, Player};
use bidwicket_core::config::Config;
use bidwicket_core::pool;

use crate::protocol::{AuctionCommand, SessionSnapshot, UiUpdate};

// ---------------------------------------------------------------------------
// Lot countdown
// ---------------------------------------------------------------------------

/// Deadline for the active lot. Knows nothing about the ledger.
#[derive(Debug, Clone)]
pub struct LotTimer {
    duration: Duration,
    deadline: Option<Instant>,
}

impl LotTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            deadline: None,
        }
    }

    /// Start (or restart) the countdown from `now`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.duration);
    }

    pub fn clear(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The ledger plus its countdown.
#[derive(Debug)]
pub struct Session {
    ledger: AuctionLedger,
    timer: LotTimer,
}

impl Session {
    pub fn new(ledger: AuctionLedger, lot_duration: Duration) -> Self {
        Self {
            ledger,
            timer: LotTimer::new(lot_duration),
        }
    }

    pub fn ledger(&self) -> &AuctionLedger {
        &self.ledger
    }

    pub fn timer(&self) -> &LotTimer {
        &self.timer
    }

    pub fn into_ledger(self) -> AuctionLedger {
        self.ledger
    }

    /// Apply one command. On error nothing has changed, countdown included.
    pub fn apply(&mut self, cmd: AuctionCommand, now: Instant) -> Result<(), AuctionError> {
        match cmd {
            AuctionCommand::StartLot => {
                self.ledger.start_lot()?;
                self.timer.arm(now);
            }
            AuctionCommand::Bid { team } => {
                self.ledger.place_bid(&team)?;
                self.timer.arm(now);
            }
            AuctionCommand::Pass => {
                self.ledger.finalize_lot()?;
                self.timer.clear();
            }
            AuctionCommand::Undo => {
                self.ledger.undo_last()?;
            }
            AuctionCommand::Snapshot | AuctionCommand::Quit => {}
        }
        Ok(())
    }

    /// Finalize the active lot if its countdown has run out.
    pub fn close_expired_lot(&mut self, now: Instant) -> Option<HistoryEntry> {
        if !self.timer.is_expired(now) {
            return None;
        }
        self.timer.clear();
        match self.ledger.finalize_lot() {
            Ok(entry) => Some(entry.clone()),
            Err(e) => {
                warn!("Countdown expired but lot could not be closed: {}", e);
                None
            }
        }
    }

    pub fn snapshot(&self, now: Instant) -> SessionSnapshot {
        SessionSnapshot {
            auction: self.ledger.snapshot(),
            time_remaining_secs: self
                .timer
                .remaining(now)
                .map(|d| d.as_secs_f64().ceil() as u64),
        }
    }
}

// ---------------------------------------------------------------------------
// Construction from config
// ---------------------------------------------------------------------------

/// Build a ledger from config and an already-loaded player pool, applying
/// any retained players.
pub fn ledger_from_parts(config: &Config, players: Vec<Player>) -> anyhow::Result<AuctionLedger> {
    let mut ledger = AuctionLedger::new(config.teams(), players, config.rules(), config.selector())
        .context("invalid auction setup")?;

    for r in &config.retained {
        ledger
            .retain(&r.team, &r.player, r.price)
            .with_context(|| format!("failed to retain {} for {}", r.player, r.team))?;
    }

    Ok(ledger)
}

/// Load the player pool named in `config` (relative to `base_dir`) and build
/// a ready-to-run session.
pub fn session_from_config(config: &Config, base_dir: &Path) -> anyhow::Result<Session> {
    let players_path = config.players_path(base_dir);
    let players = pool::load_players(&players_path).context("failed to load player pool")?;
    let ledger = ledger_from_parts(config, players)?;
    info!(
        "Session '{}' ready: {} players in pool, {} retained",
        config.auction.name,
        ledger.pool().len(),
        config.retained.len()
    );
    Ok(Session::new(ledger, config.lot_duration()))
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the session event loop.
///
/// Listens for commands and for the lot deadline using `tokio::select!`,
/// pushing updates through `ui_tx`. Returns the ledger once a `Quit` command
/// arrives or the command channel closes.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<AuctionCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut session: Session,
) -> anyhow::Result<AuctionLedger> {
    info!("Auction session loop started");

    loop {
        let deadline = session.timer().deadline();

        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(AuctionCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        debug!("Command: {:?}", cmd);
                        let update = match session.apply(cmd, Instant::now()) {
                            Ok(()) => UiUpdate::StateSnapshot(Box::new(session.snapshot(Instant::now()))),
                            Err(e) => {
                                warn!("Command rejected: {}", e);
                                UiUpdate::Rejected(e)
                            }
                        };
                        let _ = ui_tx.send(update).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Lot countdown (only while a lot is open) ---
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                let now = Instant::now();
                if let Some(entry) = session.close_expired_lot(now) {
                    info!("Countdown expired for {}", entry.player.name);
                    let _ = ui_tx.send(UiUpdate::LotClosed(entry)).await;
                    let _ = ui_tx
                        .send(UiUpdate::StateSnapshot(Box::new(session.snapshot(now))))
                        .await;
                }
            }
        }
    }

    info!("Auction session loop exiting");
    Ok(session.into_ledger())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bidwicket_core::auction::{
        AuctionRules, LotOutcome, Role, SequentialSelector, Team,
    };
    use bidwicket_core::Money;

    const LOT_SECS: u64 = 15;

    fn cr(crore: f64) -> Money {
        Money::from_crore(crore).unwrap()
    }

    fn test_session() -> Session {
        let teams = vec![
            Team::new("Ayush", cr(120.0)),
            Team::new("Shobhit", cr(120.0)),
            Team::new("Shubham", cr(1.0)),
        ];
        let players = vec![
            Player::new("Player C", Role::AllRounder, 92),
            Player::new("Player B", Role::Bowler, 84),
        ];
        let ledger = AuctionLedger::new(
            teams,
            players,
            AuctionRules::default(),
            Box::new(SequentialSelector),
        )
        .unwrap();
        Session::new(ledger, Duration::from_secs(LOT_SECS))
    }

    fn bid(team: &str) -> AuctionCommand {
        AuctionCommand::Bid { team: team.into() }
    }

    fn expect_snapshot(update: Option<UiUpdate>) -> SessionSnapshot {
        match update {
            Some(UiUpdate::StateSnapshot(s)) => *s,
            other => panic!("expected StateSnapshot, got: {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // LotTimer
    // -----------------------------------------------------------------------

    #[test]
    fn timer_arm_and_expire() {
        let t0 = Instant::now();
        let mut timer = LotTimer::new(Duration::from_secs(10));
        assert_eq!(timer.remaining(t0), None);
        assert!(!timer.is_expired(t0 + Duration::from_secs(100)));

        timer.arm(t0);
        assert_eq!(timer.remaining(t0 + Duration::from_secs(4)), Some(Duration::from_secs(6)));
        assert!(!timer.is_expired(t0 + Duration::from_secs(9)));
        assert!(timer.is_expired(t0 + Duration::from_secs(10)));
        assert_eq!(timer.remaining(t0 + Duration::from_secs(30)), Some(Duration::ZERO));

        timer.clear();
        assert_eq!(timer.deadline(), None);
    }

    // -----------------------------------------------------------------------
    // Session (synchronous)
    // -----------------------------------------------------------------------

    #[test]
    fn start_and_bid_arm_countdown() {
        let mut s = test_session();
        let t0 = Instant::now();
        s.apply(AuctionCommand::StartLot, t0).unwrap();
        assert_eq!(s.timer().deadline(), Some(t0 + Duration::from_secs(LOT_SECS)));

        let t1 = t0 + Duration::from_secs(9);
        s.apply(bid("Ayush"), t1).unwrap();
        assert_eq!(s.timer().deadline(), Some(t1 + Duration::from_secs(LOT_SECS)));
        assert_eq!(s.snapshot(t1).time_remaining_secs, Some(LOT_SECS));
    }

    #[test]
    fn rejected_bid_keeps_countdown() {
        let mut s = test_session();
        let t0 = Instant::now();
        s.apply(AuctionCommand::StartLot, t0).unwrap();
        let err = s
            .apply(bid("Shubham"), t0 + Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, AuctionError::InsufficientFunds { .. }));
        assert_eq!(s.timer().deadline(), Some(t0 + Duration::from_secs(LOT_SECS)));
    }

    #[test]
    fn pass_closes_lot_and_clears_countdown() {
        let mut s = test_session();
        let t0 = Instant::now();
        s.apply(AuctionCommand::StartLot, t0).unwrap();
        s.apply(bid("Shobhit"), t0).unwrap();
        s.apply(AuctionCommand::Pass, t0).unwrap();
        assert_eq!(s.timer().deadline(), None);
        assert_eq!(s.ledger().team("Shobhit").unwrap().purse, cr(117.5));
        assert_eq!(s.snapshot(t0).time_remaining_secs, None);
    }

    #[test]
    fn close_expired_lot_only_after_deadline() {
        let mut s = test_session();
        let t0 = Instant::now();
        s.apply(AuctionCommand::StartLot, t0).unwrap();
        assert!(s.close_expired_lot(t0 + Duration::from_secs(LOT_SECS - 1)).is_none());
        assert!(s.ledger().current_lot().is_some());

        let entry = s
            .close_expired_lot(t0 + Duration::from_secs(LOT_SECS))
            .unwrap();
        assert_eq!(entry.outcome, LotOutcome::Unsold);
        assert!(s.ledger().current_lot().is_none());
        assert_eq!(s.timer().deadline(), None);
    }

    #[test]
    fn undo_and_snapshot_commands() {
        let mut s = test_session();
        let t0 = Instant::now();
        assert_eq!(
            s.apply(AuctionCommand::Undo, t0).unwrap_err(),
            AuctionError::EmptyHistory
        );
        s.apply(AuctionCommand::StartLot, t0).unwrap();
        s.apply(AuctionCommand::Pass, t0).unwrap();
        s.apply(AuctionCommand::Undo, t0).unwrap();
        assert_eq!(s.ledger().pool().len(), 2);
        s.apply(AuctionCommand::Snapshot, t0).unwrap();
    }

    // -----------------------------------------------------------------------
    // Async event loop
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn event_loop_handles_quit_command() {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, _ui_rx) = mpsc::channel(64);
        let handle = tokio::spawn(run(cmd_rx, ui_tx, test_session()));

        cmd_tx.send(AuctionCommand::Quit).await.unwrap();

        let ledger = handle.await.unwrap().unwrap();
        assert_eq!(ledger.pool().len(), 2);
    }

    #[tokio::test]
    async fn event_loop_exits_when_commands_close() {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, _ui_rx) = mpsc::channel(64);
        let handle = tokio::spawn(run(cmd_rx, ui_tx, test_session()));
        drop(cmd_tx);
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn event_loop_bidding_and_rejection() {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, mut ui_rx) = mpsc::channel(64);
        let handle = tokio::spawn(run(cmd_rx, ui_tx, test_session()));

        cmd_tx.send(AuctionCommand::StartLot).await.unwrap();
        let snap = expect_snapshot(ui_rx.recv().await);
        let lot = snap.auction.lot.unwrap();
        assert_eq!(lot.player.name, "Player C");
        assert_eq!(lot.price, cr(2.0));
        assert_eq!(snap.time_remaining_secs, Some(LOT_SECS));

        cmd_tx.send(bid("Ayush")).await.unwrap();
        let snap = expect_snapshot(ui_rx.recv().await);
        assert_eq!(snap.auction.lot.unwrap().leader.as_deref(), Some("Ayush"));

        cmd_tx.send(bid("Ayush")).await.unwrap();
        assert_eq!(
            ui_rx.recv().await,
            Some(UiUpdate::Rejected(AuctionError::TeamAlreadyLeading {
                team: "Ayush".into()
            }))
        );

        cmd_tx.send(AuctionCommand::Pass).await.unwrap();
        let snap = expect_snapshot(ui_rx.recv().await);
        assert!(snap.auction.lot.is_none());
        assert_eq!(snap.auction.history.len(), 1);

        cmd_tx.send(AuctionCommand::Quit).await.unwrap();
        let ledger = handle.await.unwrap().unwrap();
        assert_eq!(ledger.team("Ayush").unwrap().purse, cr(117.5));
    }

    #[tokio::test(start_paused = true)]
    async fn event_loop_countdown_closes_lot() {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, mut ui_rx) = mpsc::channel(64);
        let handle = tokio::spawn(run(cmd_rx, ui_tx, test_session()));

        cmd_tx.send(AuctionCommand::StartLot).await.unwrap();
        expect_snapshot(ui_rx.recv().await);

        tokio::time::advance(Duration::from_secs(10)).await;
        cmd_tx.send(bid("Shobhit")).await.unwrap();
        let snap = expect_snapshot(ui_rx.recv().await);
        assert_eq!(snap.time_remaining_secs, Some(LOT_SECS));

        // The bid pushed the deadline out; 10s later the lot is still open.
        tokio::time::advance(Duration::from_secs(10)).await;
        cmd_tx.send(AuctionCommand::Snapshot).await.unwrap();
        let snap = expect_snapshot(ui_rx.recv().await);
        assert!(snap.auction.lot.is_some());
        assert_eq!(snap.time_remaining_secs, Some(5));

        // With nothing else to do, paused time runs forward to the deadline.
        match ui_rx.recv().await {
            Some(UiUpdate::LotClosed(entry)) => {
                assert_eq!(
                    entry.outcome,
                    LotOutcome::Sold {
                        team: "Shobhit".into(),
                        price: cr(2.5)
                    }
                );
            }
            other => panic!("expected LotClosed, got: {other:?}"),
        }
        let snap = expect_snapshot(ui_rx.recv().await);
        assert!(snap.auction.lot.is_none());
        assert_eq!(snap.time_remaining_secs, None);

        cmd_tx.send(AuctionCommand::Quit).await.unwrap();
        let ledger = handle.await.unwrap().unwrap();
        assert_eq!(ledger.team("Shobhit").unwrap().roster.len(), 1);
    }
}
