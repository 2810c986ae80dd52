use burn::{
    nn::{
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{log_softmax, sigmoid, tanh},
};

use crate::ml::batching::{active_batch_sizes, SortPermutation};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct GruClassifierConfig {
    pub num_layers:    usize,
    pub hidden_dim:    usize,
    pub vocab_size:    usize,
    pub padding_idx:   usize,
    pub embedding_dim: usize,
    pub dropout:       f64,
    pub label_size:    usize,
    pub batch_size:    usize,
}

impl GruClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> GruClassifier<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device);
        let layers: Vec<GruLayer<B>> = (0..self.num_layers)
            .map(|l| {
                let d_input = if l == 0 { self.embedding_dim } else { self.hidden_dim };
                self.build_gru_layer(d_input, device)
            })
            .collect();
        let head    = LinearConfig::new(self.hidden_dim, self.label_size).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        GruClassifier {
            embedding, layers, head, dropout,
            hidden_dim: self.hidden_dim,
        }
    }

    fn build_gru_layer<B: Backend>(&self, d_input: usize, device: &B::Device) -> GruLayer<B> {
        GruLayer {
            input_gates:  LinearConfig::new(d_input, 3 * self.hidden_dim).init(device),
            hidden_gates: LinearConfig::new(self.hidden_dim, 3 * self.hidden_dim).init(device),
            hidden_dim:   self.hidden_dim,
        }
    }
}

// ─── GruLayer ─────────────────────────────────────────────────────────────────
/// One GRU layer, built from two fused gate projections.
///
/// Both projections produce [reset | update | candidate] chunks of size
/// `hidden_dim`, combined per the standard GRU cell:
///
///   r  = σ(Wr·x + Ur·h)
///   z  = σ(Wz·x + Uz·h)
///   n  = tanh(Wn·x + r ⊙ Un·h)
///   h' = n + z ⊙ (h − n)
#[derive(Module, Debug)]
pub struct GruLayer<B: Backend> {
    pub input_gates:  Linear<B>,
    pub hidden_gates: Linear<B>,
    pub hidden_dim:   usize,
}

impl<B: Backend> GruLayer<B> {
    /// One timestep: x [n, d_input], h [n, hidden] → h' [n, hidden]
    pub fn step(&self, x: Tensor<B, 2>, h: Tensor<B, 2>) -> Tensor<B, 2> {
        let [n, _] = h.dims();
        let d = self.hidden_dim;

        let xg = self.input_gates.forward(x);
        let hg = self.hidden_gates.forward(h.clone());

        let r = sigmoid(
            xg.clone().slice([0..n, 0..d]) + hg.clone().slice([0..n, 0..d]),
        );
        let z = sigmoid(
            xg.clone().slice([0..n, d..2 * d]) + hg.clone().slice([0..n, d..2 * d]),
        );
        let candidate = tanh(
            xg.slice([0..n, 2 * d..3 * d]) + r * hg.slice([0..n, 2 * d..3 * d]),
        );

        candidate.clone() + z * (h - candidate)
    }
}

// ─── HiddenState ──────────────────────────────────────────────────────────────
/// The recurrent state carried across batches within an epoch:
/// one [batch, hidden] tensor per stacked layer.
///
/// The training and prediction loops own this value, pass it into each
/// forward call, and must call `detach()` on the returned state after
/// every batch — otherwise the autograd graph keeps growing across
/// batches and memory is unbounded.
#[derive(Debug, Clone)]
pub struct HiddenState<B: Backend> {
    pub layers: Vec<Tensor<B, 2>>,
}

impl<B: Backend> HiddenState<B> {
    /// All-zero initial state for the first batch of an epoch.
    pub fn zeros(num_layers: usize, batch_size: usize, hidden_dim: usize, device: &B::Device) -> Self {
        let layers = (0..num_layers)
            .map(|_| Tensor::zeros([batch_size, hidden_dim], device))
            .collect();
        Self { layers }
    }

    pub fn batch_size(&self) -> usize {
        self.layers.first().map_or(0, |t| t.dims()[0])
    }

    /// Keep only the first `batch_size` rows of every layer — handles a
    /// final batch smaller than the configured batch size.
    pub fn truncate(self, batch_size: usize) -> Self {
        let cur = self.batch_size();
        assert!(
            batch_size <= cur,
            "cannot truncate hidden state of batch {cur} to larger batch {batch_size}"
        );
        if batch_size == cur {
            return self;
        }
        let hidden_dim = self.layers[0].dims()[1];
        let layers = self
            .layers
            .into_iter()
            .map(|t| t.slice([0..batch_size, 0..hidden_dim]))
            .collect();
        Self { layers }
    }

    /// Rebind every layer to a plain value snapshot, severing its link to
    /// the computation history of the batch that produced it.
    pub fn detach(self) -> Self {
        Self { layers: self.layers.into_iter().map(Tensor::detach).collect() }
    }

    /// Reorder rows of every layer by the given permutation.
    fn permute_rows(self, indices: &[usize], device: &B::Device) -> Self {
        let idx = index_tensor::<B>(indices, device);
        Self {
            layers: self
                .layers
                .into_iter()
                .map(|t| t.select(0, idx.clone()))
                .collect(),
        }
    }
}

/// Build an Int index tensor for `Tensor::select` on the batch dimension.
fn index_tensor<B: Backend>(indices: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let idx: Vec<i32> = indices.iter().map(|&i| i as i32).collect();
    Tensor::from_ints(idx.as_slice(), device)
}

// ─── GruClassifier ────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct GruClassifier<B: Backend> {
    pub embedding:  Embedding<B>,
    pub layers:     Vec<GruLayer<B>>,
    pub head:       Linear<B>,
    pub dropout:    Dropout,
    pub hidden_dim: usize,
}

/// Everything the forward pass produces. Only `log_probs` feeds the loss;
/// `hidden` is carried to the next batch and `outputs` (the last layer's
/// state at every timestep, zero-padded past each sequence's end) feeds
/// the gradient attribution path.
pub struct ClassifierOutput<B: Backend> {
    /// Log-probabilities over labels — shape [batch, label_size]
    pub log_probs: Tensor<B, 2>,

    /// Per-timestep last-layer states in original batch order —
    /// shape [batch, max_len, hidden]
    pub outputs: Tensor<B, 3>,

    /// Final valid-timestep state per layer, original batch order
    pub hidden: HiddenState<B>,
}

impl<B: Backend> GruClassifier<B> {
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// All-zero hidden state sized for `batch_size` sequences.
    pub fn init_hidden(&self, batch_size: usize, device: &B::Device) -> HiddenState<B> {
        HiddenState::zeros(self.num_layers(), batch_size, self.hidden_dim, device)
    }

    /// Embedding lookup, exposed so the attribution path can mark the
    /// result as a gradient root before resuming the forward pass.
    pub fn embed(&self, token_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        self.embedding.forward(token_ids)
    }

    /// Full forward pass: token ids [batch, max_len] + true lengths +
    /// initial hidden state → log-probabilities over labels.
    pub fn forward(
        &self,
        token_ids: Tensor<B, 2, Int>,
        lengths: &[usize],
        hidden: HiddenState<B>,
    ) -> ClassifierOutput<B> {
        let embs = self.embed(token_ids);
        self.forward_embedded(embs, lengths, hidden)
    }

    /// Forward pass from already-embedded input [batch, max_len, emb_dim].
    ///
    /// Steps:
    ///   1. compute sort/unsort permutations from lengths
    ///   2. truncate the incoming hidden state to this batch's size
    ///   3. reorder batch rows into descending-length order
    ///   4. run the stacked GRU over the packed schedule — at timestep t
    ///      only the leading `active[t]` rows are processed, so padding
    ///      never enters the recurrence and finished sequences keep
    ///      their final valid state frozen
    ///   5. restore original batch order on outputs and hidden state
    ///   6. map the last layer's final state through the output head and
    ///      log-normalize over labels
    pub fn forward_embedded(
        &self,
        embs: Tensor<B, 3>,
        lengths: &[usize],
        hidden: HiddenState<B>,
    ) -> ClassifierOutput<B> {
        let device = embs.device();
        let batch = lengths.len();
        let [emb_batch, _, emb_dim] = embs.dims();
        assert_eq!(emb_batch, batch, "lengths must match the batch dimension");

        let perm = SortPermutation::from_lengths(lengths);
        let sorted_lengths = perm.sorted_lengths(lengths);
        let active = active_batch_sizes(&sorted_lengths);
        let max_len = active.len();

        // Truncate to the current batch (final batch may be under-full),
        // then move everything into sorted order.
        let hidden = hidden.truncate(batch).permute_rows(&perm.sort, &device);
        let embs = embs.select(0, index_tensor::<B>(&perm.sort, &device));

        let mut states = hidden.layers;
        let mut steps: Vec<Tensor<B, 3>> = Vec::with_capacity(max_len);

        for (t, &n) in active.iter().enumerate() {
            // Embeddings of the n sequences still running at time t
            let mut x = embs
                .clone()
                .slice([0..n, t..t + 1, 0..emb_dim])
                .squeeze::<2>(1);

            for (l, layer) in self.layers.iter().enumerate() {
                let prev = states[l].clone().slice([0..n, 0..self.hidden_dim]);
                let next = layer.step(x, prev);

                // Rows past `n` belong to finished sequences: their final
                // state stays frozen in place.
                states[l] = if n < batch {
                    Tensor::cat(
                        vec![next.clone(), states[l].clone().slice([n..batch, 0..self.hidden_dim])],
                        0,
                    )
                } else {
                    next.clone()
                };

                // Inter-layer dropout, as in stacked recurrent nets
                x = if l + 1 < self.layers.len() {
                    self.dropout.forward(next)
                } else {
                    next
                };
            }

            // Pad finished rows with zeros so the unpadded output keeps a
            // uniform [batch, max_len, hidden] shape.
            let step_out = if n < batch {
                let pad = Tensor::zeros([batch - n, self.hidden_dim], &device);
                Tensor::cat(vec![x, pad], 0)
            } else {
                x
            };
            steps.push(step_out.unsqueeze_dim(1));
        }

        // Back to original batch order
        let unsort_idx = index_tensor::<B>(&perm.unsort, &device);
        let outputs = Tensor::cat(steps, 1).select(0, unsort_idx);
        let hidden = HiddenState { layers: states }.permute_rows(&perm.unsort, &device);

        // The last layer's hidden state holds each sequence's final valid
        // timestep — correct under variable lengths, unlike the last
        // padded timestep of `outputs`.
        let final_state = hidden
            .layers
            .last()
            .cloned()
            .expect("classifier has at least one GRU layer");
        let log_probs = log_softmax(self.head.forward(final_state), 1);

        ClassifierOutput { log_probs, outputs, hidden }
    }

    /// Negative log-likelihood against log-softmax output.
    pub fn loss(&self, log_probs: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
        let [batch] = targets.dims();
        let picked = log_probs.gather(1, targets.reshape([batch, 1]));
        picked.mean().neg()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn test_config() -> GruClassifierConfig {
        GruClassifierConfig::new(2, 8, 20, 0, 6, 0.0, 3, 4)
    }

    fn ids(rows: &[&[i32]], device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2, Int> {
        let max = rows.iter().map(|r| r.len()).max().unwrap();
        let flat: Vec<i32> = rows
            .iter()
            .flat_map(|r| {
                let mut v = r.to_vec();
                v.resize(max, 0);
                v
            })
            .collect();
        Tensor::<TestBackend, 1, Int>::from_ints(flat.as_slice(), device)
            .reshape([rows.len(), max])
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model = test_config().init::<TestBackend>(&device);
        let input = ids(&[&[1, 5, 8, 19, 4], &[3, 4, 5, 13, 1, 14, 3]], &device);
        let hidden = model.init_hidden(2, &device);

        let out = model.forward(input, &[5, 7], hidden);
        assert_eq!(out.log_probs.dims(), [2, 3]);
        assert_eq!(out.outputs.dims(), [2, 7, 8]);
        assert_eq!(out.hidden.batch_size(), 2);
    }

    #[test]
    fn test_forward_batch_of_one() {
        let device = Default::default();
        let model = test_config().init::<TestBackend>(&device);
        let input = ids(&[&[2, 3, 4]], &device);
        let hidden = model.init_hidden(1, &device);

        let out = model.forward(input, &[3], hidden);
        assert_eq!(out.log_probs.dims(), [1, 3]);
    }

    #[test]
    fn test_truncated_hidden_for_underfull_batch() {
        let device = Default::default();
        let model = test_config().init::<TestBackend>(&device);
        // Hidden sized for 4 sequences, batch has only 2
        let hidden = model.init_hidden(4, &device);
        let input = ids(&[&[1, 2], &[3]], &device);

        let out = model.forward(input, &[2, 1], hidden);
        assert_eq!(out.log_probs.dims(), [2, 3]);
        assert_eq!(out.hidden.batch_size(), 2);
    }

    #[test]
    fn test_log_probs_normalized() {
        let device = Default::default();
        let model = test_config().init::<TestBackend>(&device);
        let input = ids(&[&[1, 2, 3]], &device);
        let hidden = model.init_hidden(1, &device);

        let out = model.forward(input, &[3], hidden);
        let probs: Vec<f32> = out.log_probs.exp().into_data().to_vec().unwrap();
        let total: f32 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-5, "probabilities sum to {total}");
    }

    #[test]
    fn test_packed_batch_matches_individual_sequences() {
        // Packing is an optimization: a variable-length batch must produce
        // the same per-sequence output as running each sequence alone.
        let device = Default::default();
        let model = test_config().init::<TestBackend>(&device);

        let batch_out = model.forward(
            ids(&[&[1, 5, 8], &[9, 2, 3, 4, 5, 6], &[7]], &device),
            &[3, 6, 1],
            model.init_hidden(3, &device),
        );
        let batch_probs: Vec<f32> = batch_out.log_probs.into_data().to_vec().unwrap();

        let singles: [(&[i32], usize); 3] = [(&[1, 5, 8], 3), (&[9, 2, 3, 4, 5, 6], 6), (&[7], 1)];
        for (i, (seq, len)) in singles.iter().enumerate() {
            let single = model.forward(ids(&[seq], &device), &[*len], model.init_hidden(1, &device));
            let single_probs: Vec<f32> = single.log_probs.into_data().to_vec().unwrap();
            for (j, &v) in single_probs.iter().enumerate() {
                let b = batch_probs[i * single_probs.len() + j];
                assert!(
                    (b - v).abs() < 1e-4,
                    "sequence {i} label {j}: batched {b} vs single {v}"
                );
            }
        }
    }

    #[test]
    fn test_nll_loss_of_certain_prediction_is_zero() {
        let device = Default::default();
        let model = test_config().init::<TestBackend>(&device);
        // log(1) = 0 for the target class
        let log_probs = Tensor::<TestBackend, 1>::from_floats([0.0, -50.0, -50.0], &device)
            .reshape([1, 3]);
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([0], &device);
        let loss: f32 = model.loss(log_probs, targets).into_scalar();
        assert!(loss.abs() < 1e-6);
    }
}
