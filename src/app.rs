use std::time::{Duration, Instant};

use alloy::primitives::{Address, TxHash, U256};

use crate::domain::{
    format_ether, select_screen, ContractEvent, Keyboard, NewKeyboard,
    Notifications, Screen, FILTERS, TOAST_LIFETIME,
};
use crate::error::WalletError;
use crate::infrastructure::runtime::{RuntimeCommand, TxKind};

/// Grid columns on wide terminals
pub const GRID_COLUMNS: usize = 2;

const STATUS_LIFETIME: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub since: Instant,
}

/// Draft for a new keyboard, edited in the create popup
#[derive(Debug, Clone, Default)]
pub struct CreateForm {
    pub draft: NewKeyboard,
    filter_index: usize,
}

impl CreateForm {
    pub fn cycle_kind(&mut self, forward: bool) {
        self.draft.kind = self.draft.kind.cycle(forward);
    }

    pub fn toggle_pbt(&mut self) {
        self.draft.is_pbt = !self.draft.is_pbt;
    }

    pub fn cycle_filter(&mut self, forward: bool) {
        let len = FILTERS.len();
        self.filter_index = if forward {
            (self.filter_index + 1) % len
        } else {
            (self.filter_index + len - 1) % len
        };
        self.draft.filter = FILTERS[self.filter_index].to_string();
    }
}

#[derive(Debug)]
pub struct App {
    /// Endpoint of the injected wallet provider, if one is available
    pub provider: Option<String>,
    /// Why no provider is available
    pub provider_note: Option<String>,
    pub account: Option<Address>,
    pub keyboards: Vec<Keyboard>,
    pub keyboards_loading: bool,
    pub contract: Address,
    /// Wei attached to each tip
    pub tip_amount: U256,
    pub notifications: Notifications,
    /// Blocking alert; input is swallowed until dismissed
    pub alert: Option<String>,
    pub create_form: Option<CreateForm>,
    pub selected: usize,
    pub status: Option<StatusMessage>,
    pub should_quit: bool,
    /// Sequence number of the most recent fetch request
    fetch_seq: u64,
    /// Epoch of the most recent subscription request
    subscription_epoch: u64,
    subscribed_account: Option<Address>,
    pending_accounts: Option<bool>,
    pending_fetch: Option<u64>,
    pending_subscribe: Option<u64>,
    pending_unsubscribe: bool,
    pending_create: Option<NewKeyboard>,
    pending_tip: Option<(usize, U256)>,
}

impl App {
    pub fn new(contract: Address, tip_amount: U256) -> Self {
        Self {
            provider: None,
            provider_note: None,
            account: None,
            keyboards: Vec::new(),
            keyboards_loading: false,
            contract,
            tip_amount,
            notifications: Notifications::new(),
            alert: None,
            create_form: None,
            selected: 0,
            status: None,
            should_quit: false,
            fetch_seq: 0,
            subscription_epoch: 0,
            subscribed_account: None,
            pending_accounts: None,
            pending_fetch: None,
            pending_subscribe: None,
            pending_unsubscribe: false,
            pending_create: None,
            pending_tip: None,
        }
    }

    pub fn screen(&self) -> Screen<'_> {
        select_screen(
            self.provider.is_some(),
            self.account,
            &self.keyboards,
            self.keyboards_loading,
        )
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, StatusLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    pub fn on_tick(&mut self) {
        if let Some(status) = self.status.as_ref() {
            if status.since.elapsed() > STATUS_LIFETIME {
                self.status = None;
            }
        }
        self.notifications.expire(TOAST_LIFETIME);
    }

    // === Provider & accounts ===

    /// Wallet provider detected: look up already-authorized accounts without
    /// prompting.
    pub fn apply_provider_ready(&mut self, endpoint: String) {
        tracing::info!(endpoint = %endpoint, "wallet provider detected");
        self.provider = Some(endpoint);
        self.provider_note = None;
        self.pending_accounts = Some(false);
    }

    pub fn apply_provider_missing(&mut self, reason: String) {
        self.provider = None;
        self.provider_note = Some(reason);
        self.sync_subscription();
    }

    /// User asked to connect. Without a provider this raises a blocking alert
    /// and does nothing else.
    pub fn connect_account(&mut self) -> Result<(), WalletError> {
        if self.provider.is_none() {
            let err = WalletError::MissingProvider;
            tracing::warn!("connect requested without a wallet provider");
            self.alert = Some(err.to_string());
            return Err(err);
        }
        self.pending_accounts = Some(true);
        self.set_status("Requesting account access…", StatusLevel::Info);
        Ok(())
    }

    pub fn apply_accounts(&mut self, interactive: bool, accounts: Vec<Address>) {
        if accounts.is_empty() && interactive {
            self.set_status("Wallet returned no accounts", StatusLevel::Warn);
        }
        self.handle_accounts(&accounts);
    }

    /// First returned account becomes the connected one; an empty list leaves
    /// the client disconnected.
    fn handle_accounts(&mut self, accounts: &[Address]) {
        let Some(&account) = accounts.first() else {
            tracing::info!("no authorized accounts yet");
            return;
        };
        tracing::info!(%account, "authorized account");
        if self.account == Some(account) {
            // Reattach if the previous subscription was lost
            self.sync_subscription();
            return;
        }
        self.account = Some(account);
        self.set_status("Connected", StatusLevel::Info);
        self.request_keyboards();
        self.sync_subscription();
    }

    // === Keyboard list ===

    /// Queue a full refetch. Only possible with a provider and an account.
    pub fn request_keyboards(&mut self) -> bool {
        if self.provider.is_none() || self.account.is_none() {
            return false;
        }
        self.fetch_seq += 1;
        self.keyboards_loading = true;
        self.pending_fetch = Some(self.fetch_seq);
        true
    }

    /// Apply a fetch result. Responses to anything but the latest request are
    /// dropped. Returns whether the list was replaced.
    pub fn apply_keyboards(&mut self, seq: u64, keyboards: Vec<Keyboard>) -> bool {
        if seq != self.fetch_seq {
            tracing::debug!(seq, latest = self.fetch_seq, "discarding stale keyboard list");
            return false;
        }
        tracing::info!(count = keyboards.len(), "retrieved keyboards");
        self.keyboards = keyboards;
        self.keyboards_loading = false;
        self.clamp_selection();
        true
    }

    pub fn apply_keyboards_failed(&mut self, seq: u64, message: String) {
        if seq != self.fetch_seq {
            tracing::debug!(seq, latest = self.fetch_seq, "ignoring stale fetch failure");
            return;
        }
        tracing::error!(seq, error = %message, "keyboard fetch failed");
        self.keyboards_loading = false;
        self.set_status(format!("Failed to load keyboards: {message}"), StatusLevel::Error);
    }

    pub fn refresh(&mut self) {
        if !self.request_keyboards() {
            self.set_status("Connect a wallet first", StatusLevel::Warn);
            return;
        }
        self.sync_subscription();
    }

    // === Contract events ===

    /// Keep exactly one subscription, bound to the current account.
    fn sync_subscription(&mut self) {
        let wanted = match (self.provider.is_some(), self.account) {
            (true, Some(account)) => Some(account),
            _ => None,
        };
        if wanted == self.subscribed_account {
            return;
        }
        self.subscription_epoch += 1;
        self.subscribed_account = wanted;
        if wanted.is_some() {
            self.pending_subscribe = Some(self.subscription_epoch);
            self.pending_unsubscribe = false;
        } else {
            self.pending_subscribe = None;
            self.pending_unsubscribe = true;
        }
    }

    /// The subscription for `epoch` failed to start or its feed closed.
    /// Forget it so the next connect or refresh subscribes again.
    pub fn apply_subscription_lost(&mut self, epoch: u64, message: Option<String>) {
        if epoch != self.subscription_epoch || self.subscribed_account.is_none() {
            tracing::debug!(epoch, current = self.subscription_epoch, "stale subscription loss");
            return;
        }
        tracing::warn!(epoch, error = ?message, "contract event subscription lost");
        self.subscribed_account = None;
        let text = message.unwrap_or_else(|| "Contract event feed closed".to_string());
        self.set_status(format!("{text} (press r to retry)"), StatusLevel::Error);
    }

    pub fn apply_contract_event(&mut self, epoch: u64, event: ContractEvent) {
        if epoch != self.subscription_epoch || self.subscribed_account.is_none() {
            tracing::debug!(epoch, current = self.subscription_epoch, "event from stale subscription");
            return;
        }
        match event {
            ContractEvent::KeyboardCreated(keyboard) => {
                if let Some(account) = self.account {
                    if !keyboard.is_owned_by(account) {
                        self.notifications
                            .push(keyboard.notification_id(), "Somebody created a new keyboard!");
                    }
                }
                self.request_keyboards();
            }
            ContractEvent::TipSent { recipient, amount } => {
                if self.account == Some(recipient) {
                    self.notifications.push(
                        format!("{recipient}{amount}"),
                        format!("You received a tip of {} eth!", format_ether(amount)),
                    );
                }
            }
        }
    }

    // === Create & tip ===

    pub fn open_create_form(&mut self) {
        if !self.screen().offers_create() {
            self.set_status("Connect a wallet first", StatusLevel::Warn);
            return;
        }
        self.create_form = Some(CreateForm::default());
    }

    pub fn cancel_create_form(&mut self) {
        self.create_form = None;
    }

    pub fn submit_create_form(&mut self) -> Result<(), WalletError> {
        let Some(form) = self.create_form.take() else {
            return Ok(());
        };
        if self.account.is_none() {
            return Err(WalletError::NotConnected);
        }
        tracing::info!(kind = ?form.draft.kind, pbt = form.draft.is_pbt, filter = %form.draft.filter, "creating keyboard");
        self.pending_create = Some(form.draft);
        self.set_status("Creating keyboard…", StatusLevel::Info);
        Ok(())
    }

    pub fn tip_selected(&mut self) -> Result<(), WalletError> {
        let account = self.account.ok_or(WalletError::NotConnected)?;
        let keyboard = self
            .keyboards
            .get(self.selected)
            .ok_or(WalletError::NoSuchKeyboard(self.selected))?;
        if keyboard.is_owned_by(account) {
            return Err(WalletError::OwnKeyboard);
        }
        self.pending_tip = Some((self.selected, self.tip_amount));
        self.set_status(
            format!("Sending {} eth tip…", format_ether(self.tip_amount)),
            StatusLevel::Info,
        );
        Ok(())
    }

    pub fn apply_tx_confirmed(&mut self, kind: TxKind, hash: TxHash) {
        tracing::info!(?kind, %hash, "transaction confirmed");
        let text = match kind {
            TxKind::Create => "Keyboard created!".to_string(),
            TxKind::Tip { index } => format!("Tip sent to keyboard #{index}"),
        };
        self.set_status(text, StatusLevel::Info);
    }

    pub fn apply_tx_failed(&mut self, kind: TxKind, message: String) {
        tracing::error!(?kind, error = %message, "transaction failed");
        let what = match kind {
            TxKind::Create => "Create",
            TxKind::Tip { .. } => "Tip",
        };
        self.set_status(format!("{what} failed: {message}"), StatusLevel::Error);
    }

    pub fn apply_error(&mut self, message: String) {
        tracing::error!(error = %message, "runtime error");
        self.set_status(message, StatusLevel::Error);
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    // === Selection ===

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.keyboards.len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let next = self.selected as isize + delta;
        self.selected = next.clamp(0, len as isize - 1) as usize;
    }

    fn clamp_selection(&mut self) {
        let len = self.keyboards.len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    // === Outgoing commands ===

    /// Drain queued requests as worker commands, teardown before setup.
    pub fn take_commands(&mut self) -> Vec<RuntimeCommand> {
        let mut commands = Vec::new();
        if std::mem::take(&mut self.pending_unsubscribe) {
            commands.push(RuntimeCommand::Unsubscribe);
        }
        if let Some(interactive) = self.pending_accounts.take() {
            commands.push(RuntimeCommand::RequestAccounts { interactive });
        }
        if let Some(epoch) = self.pending_subscribe.take() {
            commands.push(RuntimeCommand::Subscribe { epoch });
        }
        if let Some(seq) = self.pending_fetch.take() {
            commands.push(RuntimeCommand::FetchKeyboards { seq });
        }
        if let (Some(keyboard), Some(from)) = (self.pending_create.take(), self.account) {
            commands.push(RuntimeCommand::CreateKeyboard { from, keyboard });
        }
        if let (Some((index, amount)), Some(from)) = (self.pending_tip.take(), self.account) {
            commands.push(RuntimeCommand::Tip {
                from,
                index,
                amount,
            });
        }
        commands
    }
}

/// Human label for a create-form draft
pub fn describe_draft(draft: &NewKeyboard) -> String {
    let filter = if draft.filter.is_empty() {
        "no filter"
    } else {
        draft.filter.as_str()
    };
    let keycaps = if draft.is_pbt { "PBT" } else { "ABS" };
    format!("{} · {keycaps} keycaps · {filter}", draft.kind.label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{KeyboardKind, TileAction};

    fn me() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn other() -> Address {
        Address::repeat_byte(0xbb)
    }

    fn keyboard(owner: Address) -> Keyboard {
        Keyboard {
            kind: KeyboardKind::SixtyPercent,
            is_pbt: false,
            filter: String::new(),
            owner,
        }
    }

    fn connected_app() -> App {
        let mut app = App::new(Address::repeat_byte(0xee), U256::from(10u64));
        app.apply_provider_ready("http://localhost:8545".into());
        app.apply_accounts(false, vec![me()]);
        app
    }

    fn fetches(commands: &[RuntimeCommand]) -> Vec<u64> {
        commands
            .iter()
            .filter_map(|cmd| match cmd {
                RuntimeCommand::FetchKeyboards { seq } => Some(*seq),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_mount_requests_accounts_silently() {
        let mut app = App::new(Address::ZERO, U256::ZERO);
        app.apply_provider_ready("ws://node".into());
        let commands = app.take_commands();
        assert!(matches!(
            commands.as_slice(),
            [RuntimeCommand::RequestAccounts { interactive: false }]
        ));
        assert_eq!(app.screen(), Screen::Connect);
    }

    #[test]
    fn test_connect_without_provider_alerts() {
        let mut app = App::new(Address::ZERO, U256::ZERO);
        assert_eq!(app.connect_account(), Err(WalletError::MissingProvider));
        assert!(app.alert.is_some());
        assert!(app.take_commands().is_empty());
        assert_eq!(app.screen(), Screen::InstallWallet);
    }

    #[test]
    fn test_connect_requests_access() {
        let mut app = App::new(Address::ZERO, U256::ZERO);
        app.apply_provider_ready("ws://node".into());
        app.take_commands();
        app.connect_account().unwrap();
        assert!(matches!(
            app.take_commands().as_slice(),
            [RuntimeCommand::RequestAccounts { interactive: true }]
        ));
    }

    #[test]
    fn test_empty_account_list_stays_disconnected() {
        let mut app = App::new(Address::ZERO, U256::ZERO);
        app.apply_provider_ready("ws://node".into());
        app.take_commands();
        app.apply_accounts(false, vec![]);
        assert!(app.account.is_none());
        assert!(app.take_commands().is_empty());
        assert_eq!(app.screen(), Screen::Connect);
    }

    #[test]
    fn test_account_triggers_fetch_and_subscription() {
        let mut app = connected_app();
        let commands = app.take_commands();
        assert!(commands
            .iter()
            .any(|c| matches!(c, RuntimeCommand::Subscribe { epoch: 1 })));
        assert_eq!(fetches(&commands), vec![1]);
        assert!(app.keyboards_loading);
        assert_eq!(app.screen(), Screen::Loading);
    }

    #[test]
    fn test_first_account_wins() {
        let mut app = App::new(Address::ZERO, U256::ZERO);
        app.apply_provider_ready("ws://node".into());
        app.apply_accounts(false, vec![other(), me()]);
        assert_eq!(app.account, Some(other()));
    }

    #[test]
    fn test_fetch_result_replaces_list() {
        let mut app = connected_app();
        app.take_commands();
        assert!(app.apply_keyboards(1, vec![keyboard(me()), keyboard(other())]));
        assert!(!app.keyboards_loading);
        assert_eq!(app.keyboards.len(), 2);

        app.refresh();
        assert!(app.apply_keyboards(2, vec![keyboard(other())]));
        assert_eq!(app.keyboards, vec![keyboard(other())]);
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut app = connected_app();
        app.take_commands();
        app.refresh();
        assert_eq!(fetches(&app.take_commands()), vec![2]);

        // Reply to the first request lands after the second was issued
        assert!(!app.apply_keyboards(1, vec![keyboard(other())]));
        assert!(app.keyboards.is_empty());
        assert!(app.keyboards_loading);

        app.apply_keyboards_failed(1, "boom".into());
        assert!(app.keyboards_loading);

        assert!(app.apply_keyboards(2, vec![keyboard(me())]));
        assert!(!app.keyboards_loading);
    }

    #[test]
    fn test_fetch_failure_clears_loading() {
        let mut app = connected_app();
        app.take_commands();
        app.apply_keyboards_failed(1, "execution reverted".into());
        assert!(!app.keyboards_loading);
        assert_eq!(app.status_text().map(|(_, level)| level), Some(StatusLevel::Error));
        assert_eq!(app.screen(), Screen::Empty);
    }

    #[test]
    fn test_created_by_other_notifies_and_refetches() {
        let mut app = connected_app();
        app.take_commands();
        app.apply_contract_event(1, ContractEvent::KeyboardCreated(keyboard(other())));
        assert_eq!(app.notifications.len(), 1);
        assert_eq!(fetches(&app.take_commands()).len(), 1);
    }

    #[test]
    fn test_created_by_self_only_refetches() {
        let mut app = connected_app();
        app.take_commands();
        app.apply_contract_event(1, ContractEvent::KeyboardCreated(keyboard(me())));
        assert!(app.notifications.is_empty());
        assert_eq!(fetches(&app.take_commands()).len(), 1);
    }

    #[test]
    fn test_tip_to_me_notifies_with_amount() {
        let mut app = connected_app();
        app.take_commands();
        let amount = U256::from(10_000_000_000_000_000u64);
        app.apply_contract_event(1, ContractEvent::TipSent { recipient: me(), amount });
        let texts: Vec<_> = app.notifications.iter().map(|t| t.text.clone()).collect();
        assert_eq!(texts, vec!["You received a tip of 0.01 eth!".to_string()]);

        // Same recipient+amount does not stack
        app.apply_contract_event(1, ContractEvent::TipSent { recipient: me(), amount });
        assert_eq!(app.notifications.len(), 1);
    }

    #[test]
    fn test_tip_to_other_is_silent() {
        let mut app = connected_app();
        app.take_commands();
        app.apply_contract_event(
            1,
            ContractEvent::TipSent {
                recipient: other(),
                amount: U256::from(1u64),
            },
        );
        assert!(app.notifications.is_empty());
        assert!(app.take_commands().is_empty());
    }

    #[test]
    fn test_stale_epoch_events_ignored() {
        let mut app = connected_app();
        app.take_commands();
        app.apply_accounts(true, vec![other()]);
        let commands = app.take_commands();
        assert!(commands
            .iter()
            .any(|c| matches!(c, RuntimeCommand::Subscribe { epoch: 2 })));

        app.apply_contract_event(1, ContractEvent::KeyboardCreated(keyboard(me())));
        assert!(app.notifications.is_empty());
        assert!(app.take_commands().is_empty());
    }

    #[test]
    fn test_losing_provider_unsubscribes() {
        let mut app = connected_app();
        app.take_commands();
        app.apply_provider_missing("gone".into());
        assert!(matches!(
            app.take_commands().as_slice(),
            [RuntimeCommand::Unsubscribe]
        ));
        assert_eq!(app.screen(), Screen::InstallWallet);
    }

    #[test]
    fn test_lost_subscription_reattaches_on_refresh() {
        let mut app = connected_app();
        app.take_commands();
        app.apply_subscription_lost(1, Some("Event subscription failed: ws closed".into()));
        assert_eq!(app.status_text().map(|(_, level)| level), Some(StatusLevel::Error));

        app.refresh();
        let commands = app.take_commands();
        assert!(commands
            .iter()
            .any(|c| matches!(c, RuntimeCommand::Subscribe { epoch: 2 })));
        assert_eq!(fetches(&commands), vec![2]);
    }

    #[test]
    fn test_lost_subscription_reattaches_on_reconnect() {
        let mut app = connected_app();
        app.take_commands();
        app.apply_subscription_lost(1, None);

        app.connect_account().unwrap();
        app.take_commands();
        app.apply_accounts(true, vec![me()]);
        assert!(matches!(
            app.take_commands().as_slice(),
            [RuntimeCommand::Subscribe { epoch: 2 }]
        ));
    }

    #[test]
    fn test_stale_subscription_loss_ignored() {
        let mut app = connected_app();
        app.take_commands();
        app.apply_accounts(true, vec![other()]);
        app.take_commands();

        // Epoch 1 was replaced; its loss must not detach epoch 2
        app.apply_subscription_lost(1, None);
        app.refresh();
        let commands = app.take_commands();
        assert!(!commands
            .iter()
            .any(|c| matches!(c, RuntimeCommand::Subscribe { .. })));
        app.apply_contract_event(
            2,
            ContractEvent::TipSent {
                recipient: other(),
                amount: U256::from(1u64),
            },
        );
        assert_eq!(app.notifications.len(), 1);
    }

    #[test]
    fn test_tip_rules() {
        let mut app = connected_app();
        app.take_commands();
        app.apply_keyboards(1, vec![keyboard(me()), keyboard(other())]);

        app.selected = 0;
        assert_eq!(app.tip_selected(), Err(WalletError::OwnKeyboard));

        app.move_selection(1);
        assert_eq!(app.selected, 1);
        app.tip_selected().unwrap();
        assert!(matches!(
            app.take_commands().as_slice(),
            [RuntimeCommand::Tip { index: 1, from, .. }] if *from == me()
        ));

        let Screen::Grid(tiles) = app.screen() else {
            panic!("expected grid");
        };
        assert_eq!(tiles[0].action, TileAction::OwnerBadge);
        assert_eq!(tiles[1].action, TileAction::Tip);
    }

    #[test]
    fn test_create_form_submits_draft() {
        let mut app = connected_app();
        app.take_commands();
        app.apply_keyboards(1, vec![]);
        app.open_create_form();
        let form = app.create_form.as_mut().expect("form open");
        form.cycle_kind(true);
        form.toggle_pbt();
        form.cycle_filter(true);
        app.submit_create_form().unwrap();

        let commands = app.take_commands();
        let [RuntimeCommand::CreateKeyboard { from, keyboard }] = commands.as_slice() else {
            panic!("expected create command, got {commands:?}");
        };
        assert_eq!(*from, me());
        assert_eq!(keyboard.kind, KeyboardKind::SeventyFivePercent);
        assert!(keyboard.is_pbt);
        assert_eq!(keyboard.filter, "sepia");
    }

    #[test]
    fn test_create_form_needs_connection() {
        let mut app = App::new(Address::ZERO, U256::ZERO);
        app.apply_provider_ready("ws://node".into());
        app.open_create_form();
        assert!(app.create_form.is_none());
    }
}
