// Key pairs, addresses and transaction signatures

mod keys;
mod signer;

pub use keys::{
    Address, KeyError, KeyPair, WalletExport, public_key_coordinates, public_key_from_hex,
    public_key_to_hex, ADDRESS_PAYLOAD_LEN, ADDRESS_VERSION,
};
pub use signer::{sign, sign_transaction, verify, SignedTransfer, TransactionSignature};
