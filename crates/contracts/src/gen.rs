use ethers::contract::abigen;

abigen!(
    EntryPointAPI,
    r#"[
        function getNonce(address sender, uint192 key) public view returns (uint256 nonce)
    ]"#
);

abigen!(
    TokenAPI,
    r#"[
        function approve(address spender, uint256 amount) external returns (bool)
        function transfer(address to, uint256 amount) external returns (bool)
    ]"#
);

abigen!(
    SmartAccountAPI,
    r#"[
        function executeBatch(address[] targets, uint256[] values, bytes[] data) external
    ]"#
);

abigen!(
    AccountFactoryAPI,
    r#"[
        function createAccount(address owner, bytes32 salt) external returns (address account)
    ]"#
);
