//! The training step.
//!
//! [`TrainOp`] is the handle returned by [`crate::training`]. Each call to
//! [`TrainOp::run`] performs exactly one gradient-descent update of every weight and
//! bias against the masked reconstruction loss and increments the global step. The
//! caller drives the loop (batches, epochs, learning-rate changes).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rand::Rng;

use crate::{Autoencoder, Batch, Evaluation, Gradients, Mode, Result, Sgd, loss, metrics};

/// Outcome of one applied training step.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Global step after this update (the first step reports `1`).
    pub global_step: u64,
    /// Masked loss of the batch, measured before the update.
    pub loss: f32,
}

/// Loss and accuracy of a model on a batch, without dropout.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalReport {
    pub loss: f32,
    pub evaluation: Evaluation,
}

/// One plain gradient-descent step, applied on demand.
#[derive(Debug, Clone)]
pub struct TrainOp {
    optimizer: Sgd,
    /// Not trainable; only ever incremented.
    global_step: u64,
}

impl TrainOp {
    /// Returns an error if `learning_rate` is not finite or `<= 0`.
    pub fn new(learning_rate: f32) -> Result<Self> {
        Ok(Self {
            optimizer: Sgd::new(learning_rate)?,
            global_step: 0,
        })
    }

    #[inline]
    pub fn learning_rate(&self) -> f32 {
        self.optimizer.lr()
    }

    #[inline]
    /// Number of updates applied so far.
    pub fn global_step(&self) -> u64 {
        self.global_step
    }

    /// Apply precomputed gradients and bump the global step.
    ///
    /// Returns the new global step.
    pub fn apply(&mut self, model: &mut Autoencoder, grads: &Gradients) -> u64 {
        self.optimizer.step(model, grads);
        self.global_step += 1;
        self.global_step
    }

    /// Run one training step on `batch`.
    ///
    /// Forward pass with dropout sampled from `rng`, masked L2 loss, backprop through
    /// all layers, then `param -= lr * grad` for every parameter.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        model: &mut Autoencoder,
        batch: &Batch,
        rng: &mut R,
    ) -> Result<StepReport> {
        let pass = model.forward(batch.inputs(), Mode::Train, rng)?;
        let (loss, d_logits) =
            loss::masked_l2_backward(pass.logits(), batch.labels(), batch.mask())?;
        let grads = model.backward(batch.inputs(), &pass, d_logits)?;
        let global_step = self.apply(model, &grads);

        tracing::debug!(
            target: "rust_autoencoder::train",
            global_step,
            loss,
            lr = self.learning_rate(),
            "training step"
        );

        Ok(StepReport { global_step, loss })
    }
}

impl Autoencoder {
    /// Masked loss and accuracy on `batch` using deterministic inference.
    pub fn evaluate(&self, batch: &Batch) -> Result<EvalReport> {
        let logits = self.predict(batch.inputs())?;
        let loss = loss::masked_l2(&logits, batch.labels(), batch.mask())?;
        let evaluation = metrics::evaluate(&logits, batch.labels(), batch.mask())?;
        Ok(EvalReport { loss, evaluation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use ndarray::{Array2, array};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use crate::{AutoencoderBuilder, Error};

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct StepEvent {
        global_step: Option<u64>,
        loss: Option<f64>,
    }

    impl Visit for StepEvent {
        fn record_u64(&mut self, field: &Field, value: u64) {
            if field.name() == "global_step" {
                self.global_step = Some(value);
            }
        }

        fn record_f64(&mut self, field: &Field, value: f64) {
            if field.name() == "loss" {
                self.loss = Some(value);
            }
        }

        fn record_debug(&mut self, _field: &Field, _value: &dyn std::fmt::Debug) {}
    }

    /// Collects training-step events.
    #[derive(Clone, Default)]
    struct StepRecorder(Arc<Mutex<Vec<StepEvent>>>);

    impl<S: Subscriber> Layer<S> for StepRecorder {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if event.metadata().target() != "rust_autoencoder::train" {
                return;
            }
            let mut step = StepEvent::default();
            event.record(&mut step);
            self.0.lock().unwrap().push(step);
        }
    }

    fn batch() -> Batch {
        Batch::fully_observed(array![
            [0.0_f32, 1.0, 0.5],
            [1.0, 0.0, 0.25],
            [0.5, 0.5, 1.0],
            [1.0, 1.0, 0.0]
        ])
        .unwrap()
    }

    #[test]
    fn train_op_rejects_bad_learning_rate() {
        assert!(matches!(TrainOp::new(0.0), Err(Error::InvalidConfig(_))));
        assert!(TrainOp::new(f32::INFINITY).is_err());
    }

    #[test]
    fn each_run_increments_global_step_once() {
        let mut model = AutoencoderBuilder::new(3)
            .unwrap()
            .hidden_units(5, 2)
            .unwrap()
            .build_with_seed(0)
            .unwrap();
        let mut op = TrainOp::new(0.01).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(op.global_step(), 0);
        for expected in 1..=3 {
            let report = op.run(&mut model, &batch(), &mut rng).unwrap();
            assert_eq!(report.global_step, expected);
            assert!(report.loss >= 0.0);
        }
        assert_eq!(op.global_step(), 3);
    }

    #[test]
    fn run_reports_pre_update_loss() {
        let mut model = AutoencoderBuilder::new(3)
            .unwrap()
            .hidden_units(4, 2)
            .unwrap()
            .keep_prob(1.0)
            .unwrap()
            .build_with_seed(2)
            .unwrap();
        let b = batch();
        let before = model.evaluate(&b).unwrap().loss;

        let mut op = TrainOp::new(0.01).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let report = op.run(&mut model, &b, &mut rng).unwrap();
        assert!((report.loss - before).abs() < 1e-5);
    }

    #[test]
    fn masked_out_entries_do_not_move_output_bias() {
        let mut model = AutoencoderBuilder::new(3)
            .unwrap()
            .hidden_units(4, 2)
            .unwrap()
            .build_with_seed(3)
            .unwrap();
        let b = Batch::reconstruction(batch().inputs().clone(), &array![true, true, false])
            .unwrap();
        let bias_before = model.layers()[2].1.biases()[2];

        let mut op = TrainOp::new(0.05).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        op.run(&mut model, &b, &mut rng).unwrap();

        assert_eq!(model.layers()[2].1.biases()[2], bias_before);
    }

    #[test]
    fn run_rejects_batch_of_wrong_width() {
        let mut model = AutoencoderBuilder::new(4)
            .unwrap()
            .hidden_units(4, 2)
            .unwrap()
            .build_with_seed(0)
            .unwrap();
        let mut op = TrainOp::new(0.01).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let err = op.run(&mut model, &batch(), &mut rng).unwrap_err();
        assert!(matches!(err, Error::InvalidShape(_)));
        assert_eq!(op.global_step(), 0);
    }

    #[test]
    fn evaluate_counts_every_observed_entry() {
        let model = AutoencoderBuilder::new(3)
            .unwrap()
            .hidden_units(5, 2)
            .unwrap()
            .build_with_seed(0)
            .unwrap();
        let report = model.evaluate(&batch()).unwrap();
        assert_eq!(report.evaluation.total, 12);
        assert!(report.evaluation.correct <= 12);

        let zeros = Batch::fully_observed(Array2::zeros((2, 3))).unwrap();
        assert!(model.evaluate(&zeros).unwrap().loss >= 0.0);
    }

    #[test]
    fn run_emits_one_loss_event_per_step() {
        let recorder = StepRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());

        let reports: Vec<StepReport> = tracing::subscriber::with_default(subscriber, || {
            let mut model = AutoencoderBuilder::new(3)
                .unwrap()
                .hidden_units(5, 2)
                .unwrap()
                .build_with_seed(0)
                .unwrap();
            let mut op = TrainOp::new(0.01).unwrap();
            let mut rng = StdRng::seed_from_u64(0);
            (0..3)
                .map(|_| op.run(&mut model, &batch(), &mut rng).unwrap())
                .collect()
        });

        let events = recorder.0.lock().unwrap().clone();
        assert_eq!(events.len(), 3);
        for (event, report) in events.iter().zip(&reports) {
            assert_eq!(event.global_step, Some(report.global_step));
            assert_eq!(event.loss, Some(f64::from(report.loss)));
        }
    }
}
