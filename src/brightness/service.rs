use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tower::timeout::TimeoutLayer;
use tower::util::BoxService;
use tower::{BoxError, Service, ServiceBuilder};

use crate::brightness::BrightnessControl;
use crate::error::BrightnessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrightnessCommand {
    Toggle,
    Set(u8),
}

/// Boxed brightness service as stored by the pipeline. Responds with the new
/// brightness level.
pub type BrightnessDispatcher = BoxService<BrightnessCommand, u8, BoxError>;

/// Runs brightness commands against a [`BrightnessControl`] on the blocking
/// thread pool, since device writes are plain file I/O.
pub struct BrightnessService<C> {
    control: Arc<Mutex<C>>,
}

impl<C> Clone for BrightnessService<C> {
    fn clone(&self) -> Self {
        Self {
            control: self.control.clone(),
        }
    }
}

impl<C: BrightnessControl + 'static> BrightnessService<C> {
    pub fn new(control: C) -> Self {
        Self::from_shared(Arc::new(Mutex::new(control)))
    }

    pub fn from_shared(control: Arc<Mutex<C>>) -> Self {
        Self { control }
    }

    /// Boxes the service, optionally bounding every call by `timeout`.
    pub fn into_dispatcher(self, timeout: Option<Duration>) -> BrightnessDispatcher {
        let service = ServiceBuilder::new()
            .option_layer(timeout.map(TimeoutLayer::new))
            .service(self);
        BoxService::new(service)
    }
}

impl<C: BrightnessControl + 'static> Service<BrightnessCommand> for BrightnessService<C> {
    type Response = u8;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, command: BrightnessCommand) -> Self::Future {
        let control = self.control.clone();
        Box::pin(async move {
            let level = tokio::task::spawn_blocking(move || -> Result<u8, BrightnessError> {
                let mut guard = control.lock().map_err(|_| BrightnessError::Poisoned)?;
                match command {
                    BrightnessCommand::Toggle => guard.toggle(),
                    BrightnessCommand::Set(percent) => guard.set_brightness(percent).map(|_| percent),
                }
            })
            .await
            .map_err(|e| BrightnessError::Task(e.to_string()))??;
            Ok::<u8, BoxError>(level)
        })
    }
}

impl<T: BrightnessControl + ?Sized> BrightnessControl for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn brightness(&mut self) -> Result<u8, BrightnessError> {
        (**self).brightness()
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), BrightnessError> {
        (**self).set_brightness(percent)
    }

    fn toggle(&mut self) -> Result<u8, BrightnessError> {
        (**self).toggle()
    }
}
