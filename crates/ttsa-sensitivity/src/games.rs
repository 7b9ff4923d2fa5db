//! Cooperative games on set tensors
//!
//! A game over `N` players is a set tensor `v` holding the worth `v(S)` of
//! every coalition. The property checks work on "state tensors": every core
//! of `v` is re-indexed by a slice map so that one mode encodes the joint
//! membership of a player in two coalitions. For example `[0, 1, 1]` and
//! `[0, 1, 0]` give `v(T)` and `v(S)` over the three states "in neither",
//! "in both", "only in `T`", so their difference ranges over all `S ⊆ T`.
//! The smallest entry of the residual then decides the property and its
//! position names the coalitions that break it.

use crate::augment::{expand_states, sum_states};
use crate::config::EngineConfig;
use crate::error::{Result, SensitivityError};
use crate::sets::{close_chain, complement, ensure_set, from_lower, set_choose, to_lower};
use ttsa_tensorci::{cross_elementwise, cross_grid};
use ttsa_tensortrain::{
    hadamard, minimize, AbstractTensorTrain, CompressionOptions, OptimizeOptions, Tensor3,
    TensorTrain,
};

/// Outcome of a property check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The property holds up to the tolerance
    Holds,
    /// Two coalitions that break the property by the largest margin
    Pair(Vec<usize>, Vec<usize>),
    /// A coalition that breaks the property by the largest margin
    Coalition(Vec<usize>),
}

impl Verdict {
    /// True for [`Verdict::Holds`]
    pub fn holds(&self) -> bool {
        matches!(self, Self::Holds)
    }
}

fn members(point: &[usize], states: &[usize]) -> Vec<usize> {
    point
        .iter()
        .enumerate()
        .filter_map(|(i, s)| states.contains(s).then_some(i))
        .collect()
}

/// Round `residual`, find its sign-adjusted minimum and compare it with the
/// size of the game. Returns `None` when the property holds.
fn violation(
    game: &TensorTrain<f64>,
    residual: TensorTrain<f64>,
    is_cost_game: bool,
    eps: f64,
) -> Result<Option<Vec<usize>>> {
    let norm = game.norm();
    if norm == 0.0 {
        return Ok(None);
    }
    let sign = if is_cost_game { -1.0 } else { 1.0 };
    let residual = residual
        .compressed(&CompressionOptions::default().with_tolerance(eps))?
        .scaled(sign);
    let (value, point) = minimize(&residual, &OptimizeOptions::default())?;
    tracing::debug!(value, norm, "game residual minimum");
    if value / norm >= -eps {
        Ok(None)
    } else {
        Ok(Some(point))
    }
}

/// Check `v(S) + v(N \ S) = v(N)` for every coalition `S`
pub fn check_constant_sum(game: &TensorTrain<f64>, eps: f64) -> Result<bool> {
    ensure_set(game)?;
    let norm = game.norm();
    if norm == 0.0 {
        return Ok(true);
    }
    let n = game.len();
    let grand = set_choose(game, &(0..n).collect::<Vec<_>>())?;
    let pairs = game.add(&complement(game)?)?;
    let residual = TensorTrain::constant(&game.site_dims(), grand).sub(&pairs)?;
    Ok(residual.norm() / norm < eps)
}

/// Check `v(S) <= v(T)` whenever `S ⊆ T`
///
/// Otherwise returns the pair `(S, T)` with the largest drop.
pub fn check_monotone(game: &TensorTrain<f64>, eps: f64) -> Result<Verdict> {
    ensure_set(game)?;
    let larger = expand_states(game, &[0, 1, 1])?;
    let smaller = expand_states(game, &[0, 1, 0])?;
    Ok(match violation(game, larger.sub(&smaller)?, false, eps)? {
        None => Verdict::Holds,
        Some(point) => Verdict::Pair(members(&point, &[1]), members(&point, &[1, 2])),
    })
}

/// Check `v(S ∪ T) >= v(S) + v(T)` for disjoint `S`, `T`
///
/// Cost games are checked for the reverse inequality (subadditivity).
pub fn check_superadditive(
    game: &TensorTrain<f64>,
    is_cost_game: bool,
    eps: f64,
) -> Result<Verdict> {
    ensure_set(game)?;
    let union = expand_states(game, &[0, 1, 1])?;
    let first = expand_states(game, &[0, 0, 1])?;
    let second = expand_states(game, &[0, 1, 0])?;
    let residual = union.sub(&first.add(&second)?)?;
    Ok(match violation(game, residual, is_cost_game, eps)? {
        None => Verdict::Holds,
        Some(point) => Verdict::Pair(members(&point, &[2]), members(&point, &[1])),
    })
}

/// Check `v(S ∪ T) + v(S ∩ T) >= v(S) + v(T)` for all `S`, `T`
///
/// Cost games are checked for the reverse inequality (concavity).
pub fn check_convex(game: &TensorTrain<f64>, is_cost_game: bool, eps: f64) -> Result<Verdict> {
    ensure_set(game)?;
    let union = expand_states(game, &[0, 1, 1, 1])?;
    let intersection = expand_states(game, &[0, 0, 0, 1])?;
    let first = expand_states(game, &[0, 0, 1, 1])?;
    let second = expand_states(game, &[0, 1, 0, 1])?;
    let residual = union.add(&intersection)?.sub(&first.add(&second)?)?;
    Ok(match violation(game, residual, is_cost_game, eps)? {
        None => Verdict::Holds,
        Some(point) => Verdict::Pair(members(&point, &[2, 3]), members(&point, &[1, 3])),
    })
}

/// The additive game `a(S) = Σ_{i ∈ S} values[i]`, exactly at rank 2
pub fn additive_game(values: &[f64]) -> Result<TensorTrain<f64>> {
    // state 1: nothing paid yet, state 0: payment added
    let cores = values
        .iter()
        .map(|&p| {
            let mut core = Tensor3::zeros(2, 2, 2);
            for s in 0..2 {
                core.set(0, s, 0, 1.0);
                core.set(1, s, 1, 1.0);
            }
            core.set(1, 1, 0, p);
            core
        })
        .collect();
    Ok(TensorTrain::new(close_chain(cores, 1, 0))?)
}

/// Check that no coalition gets less from `payoff` than it is worth alone
///
/// Otherwise returns the coalition with the largest excess. Cost games are
/// checked for the reverse inequality.
pub fn check_core(
    game: &TensorTrain<f64>,
    payoff: &[f64],
    is_cost_game: bool,
    eps: f64,
) -> Result<Verdict> {
    ensure_set(game)?;
    if payoff.len() != game.len() {
        return Err(SensitivityError::InvalidArgument {
            message: format!(
                "payoff has {} entries for {} players",
                payoff.len(),
                game.len()
            ),
        });
    }
    let residual = additive_game(payoff)?.sub(game)?;
    Ok(match violation(game, residual, is_cost_game, eps)? {
        None => Verdict::Holds,
        Some(point) => Verdict::Coalition(members(&point, &[1])),
    })
}

fn players_where<F>(game: &TensorTrain<f64>, mut test: F) -> Result<Vec<usize>>
where
    F: FnMut(usize) -> Result<bool>,
{
    ensure_set(game)?;
    let mut players = Vec::new();
    for n in 0..game.len() {
        if test(n)? {
            players.push(n);
        }
    }
    Ok(players)
}

fn ratio(part: f64, norm: f64) -> f64 {
    if norm == 0.0 {
        0.0
    } else {
        part / norm
    }
}

/// `v(S ∪ {n}) - v(S)` over the coalitions of the other players
fn marginal(game: &TensorTrain<f64>, n: usize) -> Result<TensorTrain<f64>> {
    let core = game.site_tensor(n);
    let without = core.slice_site(0);
    let with = core.slice_site(1);
    let diff: Vec<f64> = with.iter().zip(&without).map(|(a, b)| a - b).collect();
    let core = Tensor3::from_slices(&[diff], core.left_dim(), core.right_dim());
    Ok(game.replace_site(n, core)?)
}

/// Players without whom every coalition is worth 0, ascending
pub fn veto_players(game: &TensorTrain<f64>, eps: f64) -> Result<Vec<usize>> {
    let norm = game.norm();
    players_where(game, |n| {
        Ok(ratio(game.select_site(n, &[0])?.norm(), norm) < eps)
    })
}

/// Players that add nothing to any coalition, ascending
pub fn zero_players(game: &TensorTrain<f64>, eps: f64) -> Result<Vec<usize>> {
    let norm = game.norm();
    players_where(game, |n| Ok(ratio(marginal(game, n)?.norm(), norm) < eps))
}

/// Players that add exactly their own worth to every coalition, ascending
pub fn inessential_players(game: &TensorTrain<f64>, eps: f64) -> Result<Vec<usize>> {
    let norm = game.norm();
    players_where(game, |n| {
        let gain = marginal(game, n)?;
        let alone = set_choose(game, &[n])?;
        let excess = gain.sub(&TensorTrain::constant(&gain.site_dims(), alone))?;
        Ok(ratio(excess.norm(), norm) < eps)
    })
}

/// `ln k!` for `k` in `0..=n`
fn ln_factorials(n: usize) -> Vec<f64> {
    let mut table = vec![0.0; n + 1];
    for k in 1..=n {
        table[k] = table[k - 1] + (k as f64).ln();
    }
    table
}

/// Group Shapley value of every coalition `C`: the Shapley value `C` gets
/// when its members act as one player and everyone else is unchanged
///
/// `φ(C) = Σ_{T ⊆ N \ C} (N-|T|-|C|)! |T|! / (N-|C|+1)! · (v(T ∪ C) - v(T))`
pub fn group_shapley(game: &TensorTrain<f64>, config: &EngineConfig) -> Result<TensorTrain<f64>> {
    ensure_set(game)?;
    let n = game.len();
    let options = config.cross_options();
    let ln_fact = ln_factorials(n + 1);

    // states: 0 outside, 1 in T, 2 in C
    let grids = vec![vec![0.0, 1.0, 2.0]; n];
    let weight = |rows: &[Vec<f64>]| -> Vec<f64> {
        rows.iter()
            .map(|x| {
                let t = x.iter().filter(|&&s| s == 1.0).count();
                let c = x.iter().filter(|&&s| s == 2.0).count();
                (ln_fact[n - t - c] + ln_fact[t] - ln_fact[n - c + 1]).exp()
            })
            .collect()
    };
    let weights = cross_grid(weight, &grids, &options)?.tensor_train;

    // states: 0 outside, 1 in T, 2 in C without C counted, 3 in C counted
    let weights = expand_states(&weights, &[0, 1, 2, 2])?;
    let worth = expand_states(game, &[0, 1, 0, 1])?;
    let product = cross_elementwise(&[&worth, &weights], |x: &[f64]| x[0] * x[1], &options)?;

    let with_group = expand_states(&product.tensor_train, &[0, 1, 3])?;
    let without_group = expand_states(&product.tensor_train, &[0, 1, 2])?;
    let gains = with_group.sub(&without_group)?;
    let mut result = sum_states(&gains, &[&[0, 1], &[2]])?;
    result.compress(&CompressionOptions::default().with_tolerance(0.0))?;
    tracing::info!(players = n, rank = result.rank(), "group Shapley values ready");
    Ok(result)
}

/// Shapley value of every player
pub fn shapley_values(game: &TensorTrain<f64>, config: &EngineConfig) -> Result<Vec<f64>> {
    let group = group_shapley(game, config)?;
    (0..game.len()).map(|n| set_choose(&group, &[n])).collect()
}

/// Banzhaf power index of every player
///
/// A coalition wins when its closed index reaches `threshold` times the
/// total. A player's power is the number of winning coalitions that lose
/// without it, normalized to sum to 1 (all zeros if no player ever swings).
pub fn banzhaf_power_indices(
    st: &TensorTrain<f64>,
    threshold: f64,
    config: &EngineConfig,
) -> Result<Vec<f64>> {
    ensure_set(st)?;
    let cutoff = threshold * st.sum();
    let closed = to_lower(st)?;
    let wins = cross_elementwise(
        &[&closed],
        |x: &[f64]| if x[0] >= cutoff { 1.0 } else { 0.0 },
        &config.cross_options(),
    )?
    .tensor_train;

    let swings = (0..st.len())
        .map(|n| {
            let with = wins.select_site(n, &[1])?;
            let without = wins.select_site(n, &[0])?;
            Ok(with.sum() - hadamard(&with, &without)?.sum())
        })
        .collect::<Result<Vec<f64>>>()?;
    let total: f64 = swings.iter().sum();
    if total == 0.0 {
        return Ok(vec![0.0; swings.len()]);
    }
    Ok(swings.into_iter().map(|s| s / total).collect())
}

/// Harsanyi dividend of every coalition (Möbius transform of the game)
pub fn harsanyi_dividends(game: &TensorTrain<f64>) -> Result<TensorTrain<f64>> {
    from_lower(game)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sets::{hamming_eq_mask, hamming_weight};
    use approx::assert_abs_diff_eq;

    const EPS: f64 = 1e-10;

    /// Majority game over three players: worth 1 with at least two members
    fn majority() -> TensorTrain<f64> {
        hamming_eq_mask(3, 2)
            .unwrap()
            .add(&hamming_eq_mask(3, 3).unwrap())
            .unwrap()
    }

    /// Variance components carried by the singletons only
    fn first_order(values: &[f64]) -> TensorTrain<f64> {
        let mask = hamming_eq_mask(values.len(), 1).unwrap();
        hadamard(&additive_game(values).unwrap(), &mask).unwrap()
    }

    /// `v(S) = |S|²`
    fn squared_size(n: usize) -> TensorTrain<f64> {
        let w = hamming_weight(n).unwrap();
        hadamard(&w, &w).unwrap()
    }

    #[test]
    fn test_additive_game() {
        let a = additive_game(&[1.0, 2.0, 4.0]).unwrap();
        assert_eq!(a.rank(), 2);
        assert_abs_diff_eq!(set_choose(&a, &[]).unwrap(), 0.0, epsilon = 1e-14);
        assert_abs_diff_eq!(set_choose(&a, &[0, 2]).unwrap(), 5.0, epsilon = 1e-14);
        assert_abs_diff_eq!(set_choose(&a, &[0, 1, 2]).unwrap(), 7.0, epsilon = 1e-14);
        let single = additive_game(&[3.0]).unwrap();
        assert_eq!(single.fulltensor(), vec![0.0, 3.0]);
    }

    #[test]
    fn test_monotone() {
        assert!(check_monotone(&squared_size(4), EPS).unwrap().holds());
        let falling = squared_size(3).scaled(-1.0);
        match check_monotone(&falling, EPS).unwrap() {
            Verdict::Pair(s, t) => {
                assert!(s.iter().all(|x| t.contains(x)));
                assert!(s.len() < t.len());
            }
            other => panic!("expected a pair, got {other:?}"),
        }
    }

    #[test]
    fn test_superadditive_and_convex() {
        let game = squared_size(4);
        assert!(check_superadditive(&game, false, EPS).unwrap().holds());
        assert!(check_convex(&game, false, EPS).unwrap().holds());
        // |S|² is supermodular, so as a cost game both fail
        match check_superadditive(&game, true, EPS).unwrap() {
            Verdict::Pair(s, t) => {
                assert!(!s.is_empty() && !t.is_empty());
                assert!(s.iter().all(|x| !t.contains(x)));
            }
            other => panic!("expected a pair, got {other:?}"),
        }
        assert!(!check_convex(&game, true, EPS).unwrap().holds());
        assert!(!check_convex(&majority(), false, EPS).unwrap().holds());
    }

    #[test]
    fn test_core() {
        // Additive games have exactly one core payoff
        let values = [1.0, 2.0, 3.0];
        let game = additive_game(&values).unwrap();
        assert!(check_core(&game, &values, false, EPS).unwrap().holds());
        match check_core(&game, &[0.0, 2.0, 3.0], false, EPS).unwrap() {
            Verdict::Coalition(c) => assert!(c.contains(&0)),
            other => panic!("expected a coalition, got {other:?}"),
        }
        assert!(check_core(&game, &[1.0], false, EPS).is_err());
    }

    #[test]
    fn test_constant_sum() {
        assert!(check_constant_sum(&additive_game(&[1.0, -2.0, 5.0]).unwrap(), EPS).unwrap());
        assert!(!check_constant_sum(&squared_size(3), EPS).unwrap());
    }

    #[test]
    fn test_player_classes() {
        // v(S) = [0 ∈ S]·(2 + [1 ∈ S]), player 2 is a dummy
        let game = TensorTrain::new(vec![
            Tensor3::from_data(vec![0.0, 0.0, 2.0, 1.0], 1, 2, 2),
            Tensor3::from_data(vec![1.0, 1.0, 0.0, 1.0], 2, 2, 1),
            Tensor3::from_data(vec![1.0, 1.0], 1, 2, 1),
        ])
        .unwrap();
        assert_abs_diff_eq!(set_choose(&game, &[0]).unwrap(), 2.0, epsilon = 1e-14);
        assert_abs_diff_eq!(set_choose(&game, &[0, 1]).unwrap(), 3.0, epsilon = 1e-14);
        assert_abs_diff_eq!(set_choose(&game, &[1, 2]).unwrap(), 0.0, epsilon = 1e-14);

        assert_eq!(veto_players(&game, EPS).unwrap(), vec![0]);
        assert_eq!(zero_players(&game, EPS).unwrap(), vec![2]);
        assert_eq!(inessential_players(&game, EPS).unwrap(), vec![2]);

        let additive = additive_game(&[1.0, 2.0]).unwrap();
        assert_eq!(inessential_players(&additive, EPS).unwrap(), vec![0, 1]);
        let zero = TensorTrain::<f64>::zeros(&[2, 2]);
        assert_eq!(inessential_players(&zero, EPS).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_shapley_values_of_majority_game() {
        let config = EngineConfig::default();
        let phi = shapley_values(&majority(), &config).unwrap();
        for v in &phi {
            assert_abs_diff_eq!(*v, 1.0 / 3.0, epsilon = 1e-6);
        }
        let additive = shapley_values(&additive_game(&[1.0, 2.0, 4.0]).unwrap(), &config).unwrap();
        assert_abs_diff_eq!(additive[2], 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_group_shapley_of_grand_coalition() {
        // the whole player set acting as one gets v(N) - v(∅)
        let game = squared_size(3);
        let group = group_shapley(&game, &EngineConfig::default()).unwrap();
        assert_abs_diff_eq!(set_choose(&group, &[0, 1, 2]).unwrap(), 9.0, epsilon = 1e-5);
        assert_abs_diff_eq!(set_choose(&group, &[]).unwrap(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_banzhaf() {
        let config = EngineConfig::default();
        // st concentrated on player 0: only player 0 ever swings
        let st = first_order(&[0.8, 0.1, 0.1]);
        let power = banzhaf_power_indices(&st, 0.5, &config).unwrap();
        assert_abs_diff_eq!(power[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(power[1], 0.0, epsilon = 1e-6);

        let even = banzhaf_power_indices(&first_order(&[1.0, 1.0, 1.0]), 0.5, &config).unwrap();
        for p in &even {
            assert_abs_diff_eq!(*p, 1.0 / 3.0, epsilon = 1e-6);
        }
        let never = banzhaf_power_indices(&first_order(&[0.1, 0.1]), 2.0, &config).unwrap();
        assert_eq!(never, vec![0.0, 0.0]);
    }

    #[test]
    fn test_harsanyi_dividends() {
        let d = harsanyi_dividends(&squared_size(2)).unwrap();
        // |S|² = Σ_{T ⊆ S} d(T): d({i}) = 1, d({0,1}) = 2
        assert_abs_diff_eq!(set_choose(&d, &[0]).unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(set_choose(&d, &[0, 1]).unwrap(), 2.0, epsilon = 1e-12);
    }
}
