// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::Bytes;
use alloy::sol;
use alloy_sol_types::SolCall;

sol! {
    #[sol(rpc)]
    interface BlobMint {
        /// Current acceptance threshold for blob versioned hashes.
        function target() external view returns (uint256);
        function userMinted(address account) external view returns (uint256);
        function nextTokenId() external view returns (uint256);
        function mint() external;
    }
}

pub fn mint_calldata() -> Bytes {
    BlobMint::mintCall {}.abi_encode().into()
}
