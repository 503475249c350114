//! Compact feed-forward classifier
//!
//! A two-hidden-layer MLP trained with minibatch gradient descent on
//! categorical cross-entropy. Small on purpose: the baseline dataset is a
//! few hundred rows and inference runs on every analysis window, so the
//! design target is sub-millisecond forward passes, not accuracy records.
//!
//! All randomness (weight init, and the caller's shuffling) flows through
//! a seeded `StdRng`, so training is bit-reproducible for a fixed seed.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Floor inside ln() to keep the loss finite on confident mistakes
const LOSS_EPSILON: f32 = 1e-7;

/// One dense layer: `weights[out][in]` plus per-output bias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DenseLayer {
    weights: Vec<Vec<f32>>,
    biases: Vec<f32>,
}

impl DenseLayer {
    /// Xavier-uniform init: ±sqrt(6 / (fan_in + fan_out))
    fn new(fan_in: usize, fan_out: usize, rng: &mut StdRng) -> Self {
        let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
        let weights = (0..fan_out)
            .map(|_| (0..fan_in).map(|_| rng.gen_range(-limit..limit)).collect())
            .collect();
        Self {
            weights,
            biases: vec![0.0; fan_out],
        }
    }

    /// Pre-activation output z = Wx + b
    fn forward(&self, input: &[f32]) -> Vec<f32> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, bias)| {
                row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + bias
            })
            .collect()
    }
}

/// Gradient accumulator matching one layer's shape
struct LayerGrad {
    weights: Vec<Vec<f32>>,
    biases: Vec<f32>,
}

impl LayerGrad {
    fn zeros_like(layer: &DenseLayer) -> Self {
        Self {
            weights: layer.weights.iter().map(|row| vec![0.0; row.len()]).collect(),
            biases: vec![0.0; layer.biases.len()],
        }
    }
}

/// Two-hidden-layer softmax classifier over emotion labels
///
/// Hidden activations are ReLU; the output layer is softmax. Weights are
/// immutable once the model is published inside a revision — incremental
/// updates clone the model, train the clone, and publish a new revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpClassifier {
    input_width: usize,
    output_width: usize,
    layers: Vec<DenseLayer>,
}

impl MlpClassifier {
    /// Build with seeded weight init
    ///
    /// `hidden_width` applies to both hidden layers (≈2-3× the feature
    /// arity is the intended operating range).
    pub fn new(input_width: usize, hidden_width: usize, output_width: usize, rng: &mut StdRng) -> Self {
        let layers = vec![
            DenseLayer::new(input_width, hidden_width, rng),
            DenseLayer::new(hidden_width, hidden_width, rng),
            DenseLayer::new(hidden_width, output_width, rng),
        ];
        Self {
            input_width,
            output_width,
            layers,
        }
    }

    /// Forward pass → probability distribution over classes
    ///
    /// The returned vector sums to 1 (within float epsilon). Pure and
    /// allocation-light; safe to call on every audio frame.
    pub fn predict(&self, input: &[f32]) -> Vec<f32> {
        debug_assert_eq!(input.len(), self.input_width);
        let activations = self.forward_all(input);
        activations.last().cloned().unwrap_or_default()
    }

    /// Forward pass keeping every layer's post-activation output
    ///
    /// The last activation is the softmax distribution; the ReLU derivative
    /// needed by backprop is recoverable from the hidden activations.
    fn forward_all(&self, input: &[f32]) -> Vec<Vec<f32>> {
        let mut activations: Vec<Vec<f32>> = Vec::with_capacity(self.layers.len());
        let mut current: Vec<f32> = input.to_vec();

        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            let z = layer.forward(&current);
            let a = if i == last {
                softmax(&z)
            } else {
                z.into_iter().map(|v| v.max(0.0)).collect()
            };
            activations.push(a.clone());
            current = a;
        }
        activations
    }

    /// One epoch of minibatch SGD over the given visit order
    ///
    /// `order` is a permutation of sample indices produced by the caller's
    /// seeded shuffle. Returns the mean cross-entropy loss over the epoch.
    pub fn train_epoch(
        &mut self,
        inputs: &[Vec<f32>],
        targets: &[usize],
        order: &[usize],
        batch_size: usize,
        learning_rate: f32,
    ) -> f32 {
        debug_assert_eq!(inputs.len(), targets.len());
        let mut total_loss = 0.0f32;

        for batch in order.chunks(batch_size.max(1)) {
            let mut grads: Vec<LayerGrad> =
                self.layers.iter().map(LayerGrad::zeros_like).collect();

            for &sample in batch {
                total_loss += self.accumulate_gradients(
                    &inputs[sample],
                    targets[sample],
                    &mut grads,
                );
            }

            let step = learning_rate / batch.len() as f32;
            for (layer, grad) in self.layers.iter_mut().zip(&grads) {
                for (row, grad_row) in layer.weights.iter_mut().zip(&grad.weights) {
                    for (w, g) in row.iter_mut().zip(grad_row) {
                        *w -= step * g;
                    }
                }
                for (b, g) in layer.biases.iter_mut().zip(&grad.biases) {
                    *b -= step * g;
                }
            }
        }

        if order.is_empty() {
            0.0
        } else {
            total_loss / order.len() as f32
        }
    }

    /// Backprop one sample into the gradient accumulators; returns its loss
    fn accumulate_gradients(
        &self,
        input: &[f32],
        target: usize,
        grads: &mut [LayerGrad],
    ) -> f32 {
        let activations = self.forward_all(input);
        let output = activations.last().expect("classifier has layers");
        let loss = -(output[target].max(LOSS_EPSILON)).ln();

        // Softmax + cross-entropy: output delta is simply p - y
        let mut delta: Vec<f32> = output.clone();
        delta[target] -= 1.0;

        for layer_index in (0..self.layers.len()).rev() {
            let layer_input: &[f32] = if layer_index == 0 {
                input
            } else {
                &activations[layer_index - 1]
            };

            let grad = &mut grads[layer_index];
            for (out_index, &d) in delta.iter().enumerate() {
                grad.biases[out_index] += d;
                for (in_index, &x) in layer_input.iter().enumerate() {
                    grad.weights[out_index][in_index] += d * x;
                }
            }

            if layer_index > 0 {
                // Propagate through W^T, gated by the ReLU derivative of
                // the previous layer's activation
                let layer = &self.layers[layer_index];
                let prev_activation = &activations[layer_index - 1];
                let mut next_delta = vec![0.0f32; prev_activation.len()];
                for (out_index, &d) in delta.iter().enumerate() {
                    for (in_index, w) in layer.weights[out_index].iter().enumerate() {
                        next_delta[in_index] += w * d;
                    }
                }
                for (nd, &a) in next_delta.iter_mut().zip(prev_activation) {
                    if a <= 0.0 {
                        *nd = 0.0;
                    }
                }
                delta = next_delta;
            }
        }

        loss
    }

    /// Mean cross-entropy loss over a sample set, without updating weights
    pub fn evaluate_loss(&self, inputs: &[Vec<f32>], targets: &[usize]) -> f32 {
        if inputs.is_empty() {
            return 0.0;
        }
        let total: f32 = inputs
            .iter()
            .zip(targets)
            .map(|(input, &target)| {
                let p = self.predict(input);
                -(p[target].max(LOSS_EPSILON)).ln()
            })
            .sum();
        total / inputs.len() as f32
    }
}

/// Numerically stable softmax
fn softmax(z: &[f32]) -> Vec<f32> {
    let max = z.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = z.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
