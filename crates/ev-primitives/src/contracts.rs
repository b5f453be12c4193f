//! ABI of the ERC20 contracts backing token pairs.

use alloy_sol_types::sol;

sol! {
    /// ERC20 with module controlled minting and burning.
    interface IERC20MinterBurnerDecimals {
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function mint(address to, uint256 amount) external;
        function burnCoins(address from, uint256 amount) external;
    }
}
