//! Account sampling for simulations.
//!
//! The account pool is generated once per run from the run's RNG and funded
//! at genesis. Generators borrow it read-only; balances and sequences live in
//! the chain.

use gravity_core::StakingKeeper;
use gravity_simulation::GenesisConfig;
use gravity_types::{random_accounts, SimAccount, ValAddress};
use tracing::info;

/// Voting power given to genesis validators.
pub const GENESIS_VALIDATOR_POWER: u64 = 100;

/// Uniformly pick one account.
pub fn random_account<'a, R: rand::Rng + ?Sized>(
    rng: &mut R,
    accounts: &'a [SimAccount],
) -> Option<&'a SimAccount> {
    if accounts.is_empty() {
        return None;
    }
    Some(&accounts[rng.gen_range(0..accounts.len())])
}

/// Uniformly pick one account whose derived validator address has a
/// validator record in `state`.
///
/// Returns `None` when no account in the pool is a validator.
pub fn random_validator<'a, R, S>(
    rng: &mut R,
    state: &S,
    accounts: &'a [SimAccount],
) -> Option<&'a SimAccount>
where
    R: rand::Rng + ?Sized,
    S: StakingKeeper + ?Sized,
{
    let validators: Vec<&SimAccount> = accounts
        .iter()
        .filter(|a| state.validator(&ValAddress::from(&a.address)).is_some())
        .collect();
    if validators.is_empty() {
        return None;
    }
    Some(validators[rng.gen_range(0..validators.len())])
}

/// Generate the account pool for a run.
pub fn generate_accounts<R: rand::Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<SimAccount> {
    let accounts = random_accounts(rng, count);
    info!(count = accounts.len(), "Generated simulation accounts");
    accounts
}

/// Fund every account and make the first `validators` of them validators.
pub fn genesis_for(
    genesis: GenesisConfig,
    accounts: &[SimAccount],
    validators: usize,
    balance: u128,
) -> GenesisConfig {
    let mut genesis = genesis;
    for account in accounts {
        genesis = genesis.with_account(account.address, balance);
    }
    for account in accounts.iter().take(validators) {
        genesis = genesis.with_validator(&account.address, GENESIS_VALIDATOR_POWER);
    }
    genesis
}

#[cfg(test)]
mod tests {
    use super::*;
    use gravity_core::SimApp;
    use gravity_simulation::SimChain;
    use gravity_types::test_utils::test_accounts;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_random_account_empty_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(random_account(&mut rng, &[]).is_none());
    }

    #[test]
    fn test_random_account_covers_pool() {
        let accounts = test_accounts(4);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut seen = [false; 4];
        for _ in 0..200 {
            let picked = random_account(&mut rng, &accounts).unwrap();
            let idx = accounts.iter().position(|a| a == picked).unwrap();
            seen[idx] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_random_validator_only_picks_validators() {
        let accounts = test_accounts(5);
        let genesis = genesis_for(GenesisConfig::default(), &accounts, 2, 1_000);
        let chain = SimChain::new(genesis).unwrap();
        let state = chain.state();

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let picked = random_validator(&mut rng, &state, &accounts).unwrap();
            assert!(picked == &accounts[0] || picked == &accounts[1]);
        }
    }

    #[test]
    fn test_random_validator_none_without_validators() {
        let accounts = test_accounts(5);
        let genesis = genesis_for(GenesisConfig::default(), &accounts, 0, 1_000);
        let chain = SimChain::new(genesis).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!(random_validator(&mut rng, &chain.state(), &accounts).is_none());
    }
}
