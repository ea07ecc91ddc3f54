//! Async runtime around a [`Session`].
//!
//! One task owns the session. It receives commands, executes the effects the
//! session emits on spawned tasks, feeds their completions back and wakes up
//! for debounce checks. Every state change is published as a [`SessionView`].

use std::{future, sync::Arc};

use anyhow::{anyhow, Result};
use shared::domain::AccountName;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::{debug, info, warn};

use crate::{
    error::BackendError,
    export::{export_item, DeviceExport},
    session::{Command, Completion, CreatedAccount, Effect, Session},
    transport::{BackendAddress, ContentBackend},
    upload::UploadPlan,
    view::SessionView,
};

const COMMAND_QUEUE_DEPTH: usize = 64;

/// Caller side of a running session.
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    views: watch::Receiver<SessionView>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow!("session task has stopped"))
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.views.clone()
    }

    pub fn current(&self) -> SessionView {
        self.views.borrow().clone()
    }

    /// Stops accepting commands, persists unsaved edits and waits for the task.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.commands);
        self.task
            .await
            .map_err(|err| anyhow!("session task failed: {err}"))
    }
}

pub fn spawn_session(
    session: Session,
    backend: Arc<dyn ContentBackend>,
    export: Arc<dyn DeviceExport>,
) -> SessionHandle {
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let (completions_tx, completions_rx) = mpsc::unbounded_channel();
    let (views_tx, views_rx) = watch::channel(session.view());

    let driver = Driver {
        session,
        backend,
        export,
        completions: completions_tx,
        views: views_tx,
    };
    let task = tokio::spawn(driver.run(commands_rx, completions_rx));

    SessionHandle {
        commands: commands_tx,
        views: views_rx,
        task,
    }
}

struct Driver {
    session: Session,
    backend: Arc<dyn ContentBackend>,
    export: Arc<dyn DeviceExport>,
    completions: mpsc::UnboundedSender<Completion>,
    views: watch::Sender<SessionView>,
}

impl Driver {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        info!("session started");
        loop {
            let save_check = self.session.next_save_check();
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    let effects = self.session.handle(command, Instant::now());
                    self.execute(effects);
                }
                Some(completion) = completions.recv() => {
                    let effects = self.session.complete(completion, Instant::now());
                    self.execute(effects);
                }
                _ = wait_until(save_check) => {
                    let effects = self.session.on_save_check(Instant::now());
                    self.execute(effects);
                }
            }
            self.publish();
        }

        if let Some(save) = self.session.flush() {
            info!("persisting unsaved edits before shutdown");
            perform(
                save,
                Arc::clone(&self.backend),
                Arc::clone(&self.export),
                self.completions.clone(),
            )
            .await;
            while let Ok(completion) = completions.try_recv() {
                self.session.complete(completion, Instant::now());
            }
            self.publish();
        }
        info!("session stopped");
    }

    fn execute(&self, effects: Vec<Effect>) {
        for effect in effects {
            debug!(?effect, "executing effect");
            tokio::spawn(perform(
                effect,
                Arc::clone(&self.backend),
                Arc::clone(&self.export),
                self.completions.clone(),
            ));
        }
    }

    fn publish(&self) {
        let next = self.session.view();
        self.views.send_if_modified(|view| {
            if *view == next {
                return false;
            }
            *view = next;
            true
        });
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}

async fn perform(
    effect: Effect,
    backend: Arc<dyn ContentBackend>,
    export: Arc<dyn DeviceExport>,
    completions: mpsc::UnboundedSender<Completion>,
) {
    let completion = match effect {
        Effect::ListAccounts { connection, server } => Completion::AccountsListed {
            connection,
            result: backend.list_accounts(&server).await,
        },
        Effect::FetchContent {
            epoch,
            account,
            server,
        } => Completion::ContentFetched {
            epoch,
            result: backend.fetch_content(&account, &server).await,
            account,
        },
        Effect::SaveContent {
            epoch,
            revision,
            account,
            items,
            server,
        } => Completion::ContentSaved {
            epoch,
            revision,
            result: backend.save_content(&account, &items, &server).await,
            account,
        },
        Effect::CreateAccount {
            epoch,
            name,
            server,
        } => Completion::AccountCreated {
            epoch,
            result: create_and_load(backend.as_ref(), &name, &server).await,
            name,
        },
        Effect::DeleteAccount {
            epoch,
            account,
            server,
        } => Completion::AccountDeleted {
            epoch,
            result: delete_and_list(backend.as_ref(), &account, &server).await,
            account,
        },
        Effect::Upload {
            epoch,
            account,
            server,
            plan,
        } => {
            let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
            let forward = completions.clone();
            tokio::spawn(async move {
                while let Some(progress) = progress_rx.recv().await {
                    if forward
                        .send(Completion::UploadProgressed { epoch, progress })
                        .is_err()
                    {
                        break;
                    }
                }
            });
            let result = match plan {
                UploadPlan::Singles(files) => {
                    backend
                        .upload_single_items(files, &account, &server, progress_tx)
                        .await
                }
                UploadPlan::Gallery(files) => {
                    backend
                        .upload_gallery(files, &account, &server, progress_tx)
                        .await
                }
            };
            Completion::UploadFinished { epoch, result }
        }
        Effect::Export(request) => {
            let result = export_item(export.as_ref(), &request)
                .await
                .map(|files| files.len())
                .map_err(|err| format!("{err:#}"));
            Completion::ExportFinished {
                index: request.index,
                lock_after: request.lock_after,
                result,
            }
        }
    };

    if completions.send(completion).is_err() {
        warn!("session stopped before a completion could be delivered");
    }
}

async fn create_and_load(
    backend: &dyn ContentBackend,
    name: &AccountName,
    server: &BackendAddress,
) -> Result<CreatedAccount, BackendError> {
    let outcome = backend.create_account(name, server).await?;
    let accounts = backend.list_accounts(server).await?;
    let items = backend.fetch_content(name, server).await?;
    Ok(CreatedAccount {
        outcome,
        accounts,
        items,
    })
}

async fn delete_and_list(
    backend: &dyn ContentBackend,
    account: &AccountName,
    server: &BackendAddress,
) -> Result<Vec<AccountName>, BackendError> {
    backend.delete_account(account, server).await?;
    backend.list_accounts(server).await
}

#[cfg(test)]
#[path = "tests/driver_tests.rs"]
mod tests;
