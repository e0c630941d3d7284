//! Appointment list for the signed-in user.
//!
//! # Design
//! Which list is loaded depends on the stored user's role, resolved again
//! at every load. `load()` is a no-op while another load is in flight.
//! `clear()` bumps a generation counter so a load that started before the
//! clear drops its result instead of resurrecting stale rows.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::appointment::Appointment;
use crate::events::SessionEvent;
use crate::role::Role;
use crate::services::{Api, AppointmentService};
use crate::session::Session;
use crate::stores::{ActionOutcome, Prompt, Prompter};
use crate::types::AppointmentStatus;

/// Cloned view of the store state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentsSnapshot {
    pub appointments: Vec<Appointment>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    appointments: Vec<Appointment>,
    loading: bool,
    error: Option<String>,
    generation: u64,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Confirm,
    Cancel,
}

impl Action {
    fn target(self) -> AppointmentStatus {
        match self {
            Action::Confirm => AppointmentStatus::Confirmed,
            Action::Cancel => AppointmentStatus::Cancelled,
        }
    }

    fn question(self, client_name: Option<&str>) -> Prompt {
        let message = match (self, client_name) {
            (Action::Confirm, Some(name)) => {
                format!("Do you want to confirm the appointment with {name}?")
            }
            (Action::Confirm, None) => "Do you want to confirm this appointment?".to_string(),
            (Action::Cancel, Some(name)) => {
                format!("Are you sure you want to cancel the appointment with {name}?")
            }
            (Action::Cancel, None) => "Are you sure you want to cancel this appointment?".to_string(),
        };
        let header = match self {
            Action::Confirm => "Confirm appointment",
            Action::Cancel => "Confirm cancellation",
        };
        Prompt::new(header, message)
    }

    fn done_header(self) -> &'static str {
        match self {
            Action::Confirm => "Appointment confirmed",
            Action::Cancel => "Appointment cancelled",
        }
    }
}

pub struct AppointmentsStore {
    service: AppointmentService,
    session: Arc<Session>,
    prompter: Arc<dyn Prompter>,
    state: Mutex<State>,
}

impl AppointmentsStore {
    pub fn new(api: Api, prompter: Arc<dyn Prompter>) -> Self {
        Self {
            session: api.session().clone(),
            service: AppointmentService::new(api),
            prompter,
            state: Mutex::new(State::default()),
        }
    }

    pub fn snapshot(&self) -> AppointmentsSnapshot {
        let state = self.state.lock();
        AppointmentsSnapshot {
            appointments: state.appointments.clone(),
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    pub fn appointments(&self) -> Vec<Appointment> {
        self.state.lock().appointments.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    /// Empty the list, drop any error and invalidate in-flight loads.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.appointments.clear();
        state.error = None;
        state.loading = false;
        state.generation = state.generation.wrapping_add(1);
    }

    /// Load the list that matches the stored user's role.
    pub async fn load(&self) {
        let role = match self.session.try_user_info() {
            Ok(Some(info)) => info.role(),
            Ok(None) => {
                self.clear();
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot resolve user for appointments");
                self.clear();
                return;
            }
        };

        let generation = {
            let mut state = self.state.lock();
            if state.loading {
                tracing::debug!("appointments already loading");
                return;
            }
            state.loading = true;
            state.error = None;
            state.generation
        };

        let result: Result<Vec<Appointment>, String> = match role {
            Role::Client => self
                .service
                .client_appointments(None)
                .await
                .map(|list| list.into_iter().map(Appointment::from).collect())
                .into_result(),
            Role::Provider => self
                .service
                .provider_appointments()
                .await
                .map(|list| list.into_iter().map(Appointment::from).collect())
                .into_result(),
            Role::Admin => Ok(Vec::new()),
        };

        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!("discarding appointments from a cleared session");
            return;
        }
        state.loading = false;
        match result {
            Ok(list) => {
                tracing::info!(count = list.len(), %role, "appointments loaded");
                state.appointments = list;
            }
            Err(message) => {
                state.appointments.clear();
                state.error = Some(message);
            }
        }
    }

    /// React to one session event.
    pub async fn handle_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::LoggedOut => self.clear(),
            SessionEvent::LoginSuccess => {
                self.clear();
                self.load().await;
            }
            change if change.is_valid_user_change() => {
                self.clear();
                self.load().await;
            }
            SessionEvent::UserTypeChanged { .. } => {}
        }
    }

    /// Run the event loop on a task. Abort the handle to stop listening.
    pub fn listen(self: &Arc<Self>, rx: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move { store.run(rx).await })
    }

    /// Subscribe, load once, then keep following session events.
    pub fn mount(self: &Arc<Self>) -> JoinHandle<()> {
        let rx = self.session.events().subscribe();
        let store = Arc::clone(self);
        tokio::spawn(async move {
            store.load().await;
            store.run(rx).await;
        })
    }

    async fn run(&self, mut rx: broadcast::Receiver<SessionEvent>) {
        loop {
            match rx.recv().await {
                Ok(event) => self.handle_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "appointments store lagged behind session events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Ask, then confirm `appointment` on the server.
    pub async fn confirm(&self, appointment: &mut Appointment) -> ActionOutcome {
        self.act(Action::Confirm, appointment).await
    }

    /// Ask, then cancel `appointment` on the server.
    pub async fn cancel(&self, appointment: &mut Appointment) -> ActionOutcome {
        self.act(Action::Cancel, appointment).await
    }

    async fn act(&self, action: Action, appointment: &mut Appointment) -> ActionOutcome {
        let client_name = match self.session.user_type() {
            Role::Provider => appointment.client_name(),
            _ => None,
        };
        if !self.prompter.confirm(&action.question(client_name)).await {
            return ActionOutcome::Declined;
        }

        let id = appointment.id();
        let envelope = match action {
            Action::Confirm => self.service.confirm(id).await,
            Action::Cancel => self.service.cancel(id).await,
        };

        if !envelope.success {
            self.prompter
                .notify(&Prompt::new("Error", envelope.message.clone()))
                .await;
            return ActionOutcome::Failed(envelope.message);
        }

        let status = action.target();
        appointment.set_status(status);
        {
            let mut state = self.state.lock();
            if let Some(row) = state.appointments.iter_mut().find(|a| a.id() == id) {
                row.set_status(status);
            }
        }
        tracing::info!(id, ?status, "appointment updated");
        self.prompter
            .notify(&Prompt::new(action.done_header(), envelope.message))
            .await;
        ActionOutcome::Applied
    }
}
