use ledger_client::call::Call;
use ledger_client::ledger::Ledger;
use ledger_client::tx_submitter::TxReceipt;
use subxt::utils::AccountId32;
use subxt_signer::sr25519::Keypair;

use crate::error::Result;
use crate::SubnetFixtures;

impl<L: Ledger> SubnetFixtures<L> {
    /// Dispatches `call` as `real`, signed by its proxy `delegate`.
    ///
    /// The relayed call can be anything, so there is no value to read back; success means
    /// the proxy call was finalized and dispatched.
    pub async fn send_proxy_call(
        &self,
        call: Call,
        real: &AccountId32,
        delegate: &Keypair,
    ) -> Result<TxReceipt> {
        self.submit(Call::proxy(real.clone(), call), delegate).await
    }
}
