use tracing::debug;

use super::TextCompletion;

const USER_MODEL: &str = r#"```javascript
const mongoose = require('mongoose');
const bcrypt = require('bcryptjs');
const UserSchema = new mongoose.Schema({
    username: { type: String, required: true, unique: true, trim: true },
    email: { type: String, required: true, unique: true, trim: true, lowercase: true },
    password: { type: String, required: true }
}, { timestamps: true });
UserSchema.pre('save', async function (next) {
    if (!this.isModified('password')) return next();
    try {
        const salt = await bcrypt.genSalt(10);
        this.password = await bcrypt.hash(this.password, salt);
        next();
    } catch (error) { next(error); }
});
module.exports = mongoose.model('User', UserSchema);
```"#;

const PRODUCT_MODEL: &str = r#"```javascript
const mongoose = require('mongoose');
const ProductSchema = new mongoose.Schema({
    name: { type: String, required: true, trim: true },
    price: { type: Number, required: true, min: 0 },
    description: { type: String, required: false },
    inStock: { type: Boolean, required: true, default: true }
}, { timestamps: true });
module.exports = mongoose.model('Product', ProductSchema);
```"#;

const CREATE_USER: &str = r#"```javascript
exports.createUserController = async (req, res) => {
    try {
        const { username, email, password } = req.body;
        const existingUser = await User.findOne({ $or: [{ email }, { username }] });
        if (existingUser) {
            return res.status(409).json({ message: 'User already exists.' });
        }
        const newUser = new User({ username, email, password });
        await newUser.save();
        const userObject = newUser.toObject();
        delete userObject.password;
        res.status(201).json(userObject);
    } catch (error) {
        res.status(500).json({ message: 'Server error while creating user.', error: error.message });
    }
};
```"#;

const GET_ALL_USERS: &str = r#"```javascript
exports.getAllUsersController = async (req, res) => {
    try {
        const users = await User.find().select('-password');
        res.status(200).json(users);
    } catch (error) {
        res.status(500).json({ message: 'Server error while fetching users.', error: error.message });
    }
};
```"#;

const GET_USER_BY_ID: &str = r#"```javascript
exports.getUserByIdController = async (req, res) => {
    try {
        const user = await User.findById(req.params.id).select('-password');
        if (!user) {
            return res.status(404).json({ message: 'User not found.' });
        }
        res.status(200).json(user);
    } catch (error) {
        res.status(500).json({ message: 'Server error while fetching user.', error: error.message });
    }
};
```"#;

const USERS_ROUTER: &str = r#"```javascript
const express = require('express');
const router = express.Router();
const { createUserController, getAllUsersController, getUserByIdController } = require('../controllers/user.controller');

// Create a new user
router.post('/', createUserController);

// Get all users
router.get('/', getAllUsersController);

// Get a single user by ID
router.get('/:id', getUserByIdController);

module.exports = router;
```"#;

const PRODUCTS_ROUTER: &str = "```javascript\n// Placeholder for product routes\n```";

const PLACEHOLDER: &str = "```javascript\n// LLM placeholder response\n```";

/// Offline provider answering from canned responses.
///
/// The first entry whose key is a substring of the prompt wins; unmatched
/// prompts get a placeholder block. Extra entries can be pushed in front of
/// the built-in table with [`FixtureCompletion::with_response`].
#[derive(Debug, Clone)]
pub struct FixtureCompletion {
    responses: Vec<(String, String)>,
    fallback: String,
}

impl Default for FixtureCompletion {
    fn default() -> Self {
        let builtin = [
            (
                "Mongoose schema and model file for a schema named \"User\"",
                USER_MODEL,
            ),
            (
                "Mongoose schema and model file for a schema named \"Product\"",
                PRODUCT_MODEL,
            ),
            ("controller function named `createUserController`", CREATE_USER),
            ("controller function named `getAllUsersController`", GET_ALL_USERS),
            ("controller function named `getUserByIdController`", GET_USER_BY_ID),
            ("Express router file for the 'users' routes", USERS_ROUTER),
            ("Express router file for the 'products' routes", PRODUCTS_ROUTER),
        ];
        Self {
            responses: builtin
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            fallback: PLACEHOLDER.to_string(),
        }
    }
}

impl FixtureCompletion {
    /// Answer prompts containing `needle` with `response`, ahead of existing entries.
    pub fn with_response(mut self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses.insert(0, (needle.into(), response.into()));
        self
    }
}

impl TextCompletion for FixtureCompletion {
    fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let hit = self
            .responses
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()));
        match hit {
            Some((needle, response)) => {
                debug!(%needle, "fixture completion hit");
                Ok(response.clone())
            }
            None => {
                debug!("fixture completion fallback");
                Ok(self.fallback.clone())
            }
        }
    }
}
