//! The ERC-20 ABI fragment the Inventory Tracker needs: the `Transfer` event
//! for subscriptions and `balanceOf` for polling

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
        function balanceOf(address account) external view returns (uint256);
    }
}
